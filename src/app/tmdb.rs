// src/app/tmdb.rs
//! Thin blocking client for the TMDB v3 API plus image URL helpers.
//!
//! Calls run on background threads (see `fetch.rs`); nothing here touches the UI.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::types::{Credits, MovieDetails, MoviePage};
use crate::config::AppConfig;

pub const POSTER_SIZE: &str = "w500";
pub const PROFILE_SIZE: &str = "w185";
pub const BACKDROP_SIZE: &str = "original";

/// Local stand-ins used when a record has no image path.
pub const PLACEHOLDER_POSTER: &str = "placeholder.jpg";
pub const PLACEHOLDER_AVATAR: &str = "placeholder-avatar.png";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no TMDB API key configured")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Source of movie metadata. `TmdbClient` is the real one; tests plug in fakes.
pub trait MovieSource: Send + Sync {
    fn popular(&self, page: u32) -> Result<MoviePage, ApiError>;
    fn search(&self, query: &str, page: u32) -> Result<MoviePage, ApiError>;
    fn details(&self, id: &str) -> Result<MovieDetails, ApiError>;
    fn similar(&self, id: &str) -> Result<MoviePage, ApiError>;
    fn credits(&self, id: &str) -> Result<Credits, ApiError>;
}

pub struct TmdbClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TmdbClient {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("cinedex/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.tmdb_api_url.trim_end_matches('/').to_string(),
            api_key: cfg.tmdb_api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ApiError::MissingApiKey);
        };
        let url = self.endpoint(path);
        debug!("GET {url} {:?}", params);

        let resp = self
            .http
            .get(&url)
            .query(&[("api_key", key)])
            .query(params)
            .send()
            .map_err(|e| {
                warn!("GET {url} failed: {e}");
                ApiError::Network(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("GET {url} returned HTTP {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp
            .text()
            .map_err(|e| ApiError::Network(format!("read body: {e}")))?;
        decode(&body)
    }
}

fn movie_path(id: &str, suffix: &str) -> String {
    format!("/movie/{}{}", urlencoding::encode(id.trim()), suffix)
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

impl MovieSource for TmdbClient {
    fn popular(&self, page: u32) -> Result<MoviePage, ApiError> {
        self.get_json("/movie/popular", &[("page", page.max(1).to_string())])
    }

    fn search(&self, query: &str, page: u32) -> Result<MoviePage, ApiError> {
        self.get_json(
            "/search/movie",
            &[
                ("query", query.to_string()),
                ("page", page.max(1).to_string()),
            ],
        )
    }

    fn details(&self, id: &str) -> Result<MovieDetails, ApiError> {
        self.get_json(&movie_path(id, ""), &[])
    }

    fn similar(&self, id: &str) -> Result<MoviePage, ApiError> {
        self.get_json(&movie_path(id, "/similar"), &[])
    }

    fn credits(&self, id: &str) -> Result<Credits, ApiError> {
        self.get_json(&movie_path(id, "/credits"), &[])
    }
}

/// Builds display URLs for remote images.
#[derive(Clone, Debug)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(&cfg.tmdb_image_url)
    }

    /// Absent or blank path yields `placeholder`; otherwise `{base}/{size}{path}`.
    pub fn url(&self, path: Option<&str>, size: &str, placeholder: &str) -> String {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) if p.starts_with('/') => format!("{}/{}{}", self.base, size, p),
            Some(p) => format!("{}/{}/{}", self.base, size, p),
            None => placeholder.to_string(),
        }
    }

    pub fn poster(&self, path: Option<&str>) -> String {
        self.url(path, POSTER_SIZE, PLACEHOLDER_POSTER)
    }

    pub fn profile(&self, path: Option<&str>) -> String {
        self.url(path, PROFILE_SIZE, PLACEHOLDER_AVATAR)
    }

    pub fn backdrop(&self, path: Option<&str>) -> String {
        self.url(path, BACKDROP_SIZE, PLACEHOLDER_POSTER)
    }
}

pub fn is_placeholder(url: &str) -> bool {
    url == PLACEHOLDER_POSTER || url == PLACEHOLDER_AVATAR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_joins_base_size_and_path() {
        let urls = ImageUrls::new("https://image.tmdb.org/t/p/");
        assert_eq!(
            urls.poster(Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            urls.backdrop(Some("/b.jpg")),
            "https://image.tmdb.org/t/p/original/b.jpg"
        );
        assert_eq!(
            urls.profile(Some("c.jpg")),
            "https://image.tmdb.org/t/p/w185/c.jpg"
        );
    }

    #[test]
    fn missing_image_path_falls_back_to_placeholder() {
        let urls = ImageUrls::new("https://image.tmdb.org/t/p");
        assert_eq!(urls.poster(None), PLACEHOLDER_POSTER);
        assert_eq!(urls.poster(Some("   ")), PLACEHOLDER_POSTER);
        assert_eq!(urls.profile(None), PLACEHOLDER_AVATAR);
        assert!(is_placeholder(&urls.profile(None)));
        assert!(!is_placeholder(&urls.poster(Some("/x.jpg"))));
    }

    #[test]
    fn movie_paths_are_encoded() {
        assert_eq!(movie_path("603", ""), "/movie/603");
        assert_eq!(movie_path("603", "/credits"), "/movie/603/credits");
        assert_eq!(movie_path("a b", "/similar"), "/movie/a%20b/similar");
    }

    #[test]
    fn decodes_paged_results() {
        let page: MoviePage = decode(
            r#"{"page": 1, "total_pages": 3, "total_results": 60,
                "results": [{"id": 268, "title": "Batman", "poster_path": "/b.jpg",
                             "vote_average": 7.2, "release_date": "1989-06-23"}]}"#,
        )
        .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.results[0].id, "268");
    }

    #[test]
    fn decode_failure_is_typed() {
        let err = decode::<MoviePage>("<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn requests_without_key_fail_fast() {
        let cfg = AppConfig::default();
        let client = TmdbClient::from_config(&cfg).unwrap();
        assert!(matches!(client.popular(1), Err(ApiError::MissingApiKey)));
        assert_eq!(
            client.endpoint("/movie/popular"),
            "https://api.themoviedb.org/3/movie/popular"
        );
    }
}
