// src/app/browse.rs
//! Paginated listing state for the home page (popular or search results).
//!
//! Every request carries the listing generation and the page it asked for. A
//! response is applied only if it answers the request currently in flight, so a
//! slow page from an older query can never land on top of a newer one.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::app::tmdb::ApiError;
use crate::app::types::{Movie, MoviePage};

/// Scrolling within this many points of the end asks for the next page.
pub const NEAR_BOTTOM_PX: f32 = 100.0;

pub fn near_bottom(offset_y: f32, viewport_h: f32, content_h: f32) -> bool {
    offset_y + viewport_h >= content_h - NEAR_BOTTOM_PX
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    Popular,
    Search(String),
}

impl Listing {
    /// Empty (after trimming) means the popular listing.
    pub fn from_query(query: &str) -> Self {
        let q = query.trim();
        if q.is_empty() {
            Self::Popular
        } else {
            Self::Search(q.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub listing: Listing,
    pub page: u32,
    pub generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Failed(String),
}

#[derive(Debug)]
pub struct BrowseState {
    listing: Listing,
    generation: u64,
    movies: Vec<Movie>,
    /// Last page applied; 0 before the first response.
    page: u32,
    total_pages: u32,
    load: LoadState,
    in_flight: Option<PageRequest>,
    last_request: Option<PageRequest>,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowseState {
    pub fn new() -> Self {
        Self {
            listing: Listing::Popular,
            generation: 0,
            movies: Vec::new(),
            page: 0,
            total_pages: 0,
            load: LoadState::Idle,
            in_flight: None,
            last_request: None,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.load {
            LoadState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page > 0 && self.page < self.total_pages
    }

    /// Nothing to show once loading has settled, either because the API
    /// returned no results or because the fetch failed.
    pub fn is_empty_result(&self) -> bool {
        !self.is_loading()
            && self.movies.is_empty()
            && (self.page > 0 || self.error().is_some())
    }

    pub fn heading(&self) -> String {
        match &self.listing {
            Listing::Popular => "Popular Movies".to_string(),
            Listing::Search(q) => format!("Search Results for \"{q}\""),
        }
    }

    fn issue(&mut self, page: u32) -> PageRequest {
        let req = PageRequest {
            listing: self.listing.clone(),
            page,
            generation: self.generation,
        };
        self.load = LoadState::Loading;
        self.in_flight = Some(req.clone());
        self.last_request = Some(req.clone());
        req
    }

    /// Switch listing (or reload the current one) from page 1.
    pub fn reset(&mut self, listing: Listing) -> PageRequest {
        self.generation = self.generation.wrapping_add(1);
        self.listing = listing;
        self.movies.clear();
        self.page = 0;
        self.total_pages = 0;
        self.issue(1)
    }

    /// Next page, if there is one and nothing is loading or failed. A failed
    /// page is only re-issued through `retry`.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.is_loading() || self.error().is_some() || !self.has_more() {
            return None;
        }
        let next = self.page + 1;
        Some(self.issue(next))
    }

    /// Re-issue the identical request that failed.
    pub fn retry(&mut self) -> Option<PageRequest> {
        if self.error().is_none() {
            return None;
        }
        let req = self.last_request.clone()?;
        self.load = LoadState::Loading;
        self.in_flight = Some(req.clone());
        Some(req)
    }

    /// Apply a response. Returns false when it was dropped as stale.
    pub fn apply(&mut self, req: &PageRequest, result: Result<MoviePage, ApiError>) -> bool {
        if req.generation != self.generation || self.in_flight.as_ref() != Some(req) {
            debug!(
                "dropping stale page {} (gen {}, current gen {})",
                req.page, req.generation, self.generation
            );
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                if req.page <= 1 {
                    self.movies = page.results;
                } else {
                    let mut seen: HashSet<String> =
                        self.movies.iter().map(|m| m.id.clone()).collect();
                    self.movies
                        .extend(page.results.into_iter().filter(|m| seen.insert(m.id.clone())));
                }
                self.page = req.page;
                self.total_pages = page.total_pages;
                self.load = LoadState::Idle;
            }
            Err(e) => {
                warn!("listing page {} failed: {e}", req.page);
                self.load = LoadState::Failed(e.to_string());
            }
        }
        true
    }
}
