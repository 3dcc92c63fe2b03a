use std::{env, fs, path::Path, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_TMDB_API_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_URL: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_CACHE_DIR: &str = ".cinedex_cache";

/// Where registered demo accounts live.
///
/// Neither variant is a real credential store: passwords are kept in plaintext.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserStoreKind {
    /// Kept in the process only; reset on restart.
    Memory,
    /// Persisted through the file-backed key/value store.
    File,
}

impl UserStoreKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "file" | "json" => Some(Self::File),
            "memory" | "mem" | "in_memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

impl Default for UserStoreKind {
    fn default() -> Self {
        Self::File
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_url: String,
    pub tmdb_image_url: String,
    pub cache_dir: Option<String>,
    pub user_store: UserStoreKind,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub poster_workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_api_url: DEFAULT_TMDB_API_URL.to_string(),
            tmdb_image_url: DEFAULT_TMDB_IMAGE_URL.to_string(),
            cache_dir: None,
            user_store: UserStoreKind::default(),
            search_debounce_ms: 500,
            request_timeout_secs: 15,
            poster_workers: 6,
        }
    }
}

impl AppConfig {
    pub fn cache_dir_path(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(resolve_relative_path(DEFAULT_CACHE_DIR)))
    }

    pub fn has_api_key(&self) -> bool {
        self.tmdb_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "api_key")]
    tmdb_api_key: Option<String>,
    tmdb_api_url: Option<String>,
    tmdb_image_url: Option<String>,
    cache_dir: Option<String>,
    user_store: Option<String>,
    search_debounce_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    poster_workers: Option<usize>,
}

pub fn load_config() -> AppConfig {
    let mut cfg = load_config_from(Path::new(CONFIG_FILE));
    apply_env_overrides(&mut cfg);
    cfg
}

pub fn load_config_from(cfg_path: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();

    match fs::read_to_string(cfg_path) {
        Ok(raw) => match serde_json::from_str::<RawConfig>(&raw) {
            Ok(parsed) => {
                if parsed.tmdb_api_key.is_some() {
                    cfg.tmdb_api_key = parsed.tmdb_api_key;
                    if raw.contains("\"api_key\"") {
                        warn!("`api_key` is deprecated; rename it to `tmdb_api_key` in config.json.");
                    }
                }
                if let Some(url) = parsed.tmdb_api_url {
                    cfg.tmdb_api_url = url.trim_end_matches('/').to_string();
                }
                if let Some(url) = parsed.tmdb_image_url {
                    cfg.tmdb_image_url = url.trim_end_matches('/').to_string();
                }
                if parsed.cache_dir.is_some() {
                    cfg.cache_dir = parsed.cache_dir;
                }
                if let Some(mode) = parsed.user_store {
                    match UserStoreKind::from_str(&mode) {
                        Some(kind) => cfg.user_store = kind,
                        None => warn!(
                            "Unknown user_store `{mode}` in config.json; falling back to file."
                        ),
                    }
                }
                if let Some(ms) = parsed.search_debounce_ms {
                    cfg.search_debounce_ms = ms.clamp(50, 5_000);
                }
                if let Some(secs) = parsed.request_timeout_secs {
                    cfg.request_timeout_secs = secs.clamp(1, 120);
                }
                if let Some(n) = parsed.poster_workers {
                    cfg.poster_workers = n.clamp(1, 16);
                }
                info!("Loaded config from {}", cfg_path.display());
            }
            Err(err) => {
                warn!(
                    "Failed to parse {} ({}). Using defaults.",
                    cfg_path.display(),
                    err
                );
            }
        },
        Err(_) => {
            info!("No {} found; using defaults", cfg_path.display());
        }
    }

    cfg
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(key) = non_empty_env("CINEDEX_TMDB_API_KEY") {
        cfg.tmdb_api_key = Some(key);
    }
    if let Some(url) = non_empty_env("CINEDEX_TMDB_API_URL") {
        cfg.tmdb_api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = non_empty_env("CINEDEX_TMDB_IMAGE_URL") {
        cfg.tmdb_image_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = non_empty_env("CINEDEX_CACHE_DIR") {
        cfg.cache_dir = Some(dir);
    }
    if !cfg.has_api_key() {
        warn!("No TMDB API key configured; movie lists will stay empty.");
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve a path relative to the executable's directory, falling back to the CWD.
pub fn resolve_relative_path(rel: &str) -> String {
    let base = env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(rel).to_string_lossy().into_owned()
}
