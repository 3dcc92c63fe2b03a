// src/app/prefetch.rs
//! Poster worker pool. Workers share one HTTP client and write into the disk
//! cache; the UI thread uploads finished files as textures a few per frame.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eframe::egui::{self as eg, TextureHandle};
use tracing::{error, warn};

use crate::app::cache::{url_to_cache_key, PosterCache};
use crate::app::tmdb::is_placeholder;

pub const MAX_DONE_PER_FRAME: usize = 12;
pub const MAX_UPLOADS_PER_FRAME: usize = 4;

enum PosterState {
    Pending,
    Cached(PathBuf),
    Ready(TextureHandle),
    Failed,
}

struct PosterDone {
    url: String,
    result: Result<PathBuf, String>,
}

pub struct PosterLoader {
    cache: PosterCache,
    work_tx: Option<Sender<String>>,
    done_rx: Receiver<PosterDone>,
    entries: HashMap<String, PosterState>,
}

impl PosterLoader {
    pub fn start(cache: PosterCache, workers: usize, timeout: Duration) -> Self {
        let (work_tx, work_rx) = mpsc::channel::<String>();
        let (done_tx, done_rx) = mpsc::channel::<PosterDone>();

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("cinedex/", env!("CARGO_PKG_VERSION"), " posters"))
            .timeout(timeout)
            .pool_max_idle_per_host(16)
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(
                    ACCEPT,
                    HeaderValue::from_static("image/avif,image/webp,image/*;q=0.8,*/*;q=0.5"),
                );
                h
            })
            .build();

        let work_tx = match client {
            Ok(client) => {
                let client = Arc::new(client);
                let work_rx = Arc::new(Mutex::new(work_rx));
                for _ in 0..workers.max(1) {
                    let work_rx = Arc::clone(&work_rx);
                    let done_tx = done_tx.clone();
                    let client = Arc::clone(&client);
                    let cache = cache.clone();

                    std::thread::spawn(move || loop {
                        let job = match work_rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let Ok(url) = job else { break };
                        let result = cache.fetch_with_client(&client, &url);
                        if done_tx.send(PosterDone { url, result }).is_err() {
                            break;
                        }
                    });
                }
                Some(work_tx)
            }
            Err(e) => {
                error!("poster http client build failed: {e}; posters will use placeholders");
                None
            }
        };

        Self {
            cache,
            work_tx,
            done_rx,
            entries: HashMap::new(),
        }
    }

    /// Queue a download unless the poster is known, cached, or a placeholder.
    pub fn request(&mut self, url: &str) {
        if is_placeholder(url) || self.entries.contains_key(url) {
            return;
        }
        if let Some(path) = self.cache.find(url) {
            self.entries.insert(url.to_string(), PosterState::Cached(path));
            return;
        }
        let queued = self
            .work_tx
            .as_ref()
            .is_some_and(|tx| tx.send(url.to_string()).is_ok());
        let state = if queued {
            PosterState::Pending
        } else {
            PosterState::Failed
        };
        self.entries.insert(url.to_string(), state);
    }

    /// Collect finished downloads. Returns how many arrived.
    pub fn poll(&mut self) -> usize {
        let mut drained = 0usize;
        while drained < MAX_DONE_PER_FRAME {
            match self.done_rx.try_recv() {
                Ok(done) => {
                    drained += 1;
                    let state = match done.result {
                        Ok(path) => PosterState::Cached(path),
                        Err(e) => {
                            warn!("poster download failed: {e}");
                            PosterState::Failed
                        }
                    };
                    self.entries.insert(done.url, state);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    pub fn has_pending(&self) -> bool {
        self.entries
            .values()
            .any(|s| matches!(s, PosterState::Pending | PosterState::Cached(_)))
    }

    pub fn is_failed(&self, url: &str) -> bool {
        is_placeholder(url) || matches!(self.entries.get(url), Some(PosterState::Failed))
    }

    /// Texture for `url` if ready. Requests it when unknown and uploads a cached
    /// file while `uploads_left` allows. `None` means draw the placeholder.
    pub fn texture(
        &mut self,
        ctx: &eg::Context,
        url: &str,
        uploads_left: &mut usize,
    ) -> Option<TextureHandle> {
        self.request(url);
        let path = match self.entries.get(url)? {
            PosterState::Ready(tex) => return Some(tex.clone()),
            PosterState::Cached(path) if *uploads_left > 0 => path.clone(),
            _ => return None,
        };
        *uploads_left -= 1;
        let (state, tex) =
            match crate::app::gfx::load_texture_from_path(ctx, &path, &url_to_cache_key(url)) {
                Ok(tex) => (PosterState::Ready(tex.clone()), Some(tex)),
                Err(e) => {
                    warn!("poster upload failed: {e}");
                    (PosterState::Failed, None)
                }
            };
        self.entries.insert(url.to_string(), state);
        tex
    }
}
