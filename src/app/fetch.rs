// src/app/fetch.rs
//! Background fetches. Each request runs on its own thread and reports back over
//! one channel that the UI drains every frame.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use eframe::egui as eg;
use tracing::debug;

use crate::app::browse::{Listing, PageRequest};
use crate::app::detail::DetailPart;
use crate::app::tmdb::{ApiError, MovieSource};
use crate::app::types::MoviePage;

#[derive(Debug)]
pub enum FetchMsg {
    Page {
        req: PageRequest,
        result: Result<MoviePage, ApiError>,
    },
    Detail {
        id: String,
        part: DetailPart,
    },
}

pub struct Fetcher {
    source: Arc<dyn MovieSource>,
    tx: Sender<FetchMsg>,
    rx: Receiver<FetchMsg>,
    repaint: Option<eg::Context>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn MovieSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            repaint: None,
        }
    }

    /// Wake the UI whenever a result lands.
    pub fn set_repaint(&mut self, ctx: eg::Context) {
        self.repaint = Some(ctx);
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&dyn MovieSource) -> FetchMsg + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        std::thread::spawn(move || {
            let msg = job(source.as_ref());
            // receiver gone means the app is shutting down
            if tx.send(msg).is_ok() {
                if let Some(ctx) = repaint {
                    ctx.request_repaint();
                }
            }
        });
    }

    pub fn request_page(&self, req: PageRequest) {
        debug!("fetch page {} of {:?}", req.page, req.listing);
        self.spawn(move |src| {
            let result = match &req.listing {
                Listing::Popular => src.popular(req.page),
                Listing::Search(q) => src.search(q, req.page),
            };
            FetchMsg::Page { req, result }
        });
    }

    /// Details, similar and credits as three independent fetches.
    pub fn request_detail(&self, id: &str) {
        debug!("fetch detail {id}");
        let jobs: [fn(&dyn MovieSource, &str) -> DetailPart; 3] = [
            |s, id| DetailPart::Details(s.details(id)),
            |s, id| DetailPart::Similar(s.similar(id)),
            |s, id| DetailPart::Credits(s.credits(id)),
        ];
        for job in jobs {
            let id = id.to_string();
            self.spawn(move |src| {
                let part = job(src, &id);
                FetchMsg::Detail { id, part }
            });
        }
    }

    /// Up to `max` finished results, oldest first.
    pub fn drain(&self, max: usize) -> Vec<FetchMsg> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.rx.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    #[cfg(test)]
    fn wait(&self, timeout: std::time::Duration) -> Option<FetchMsg> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::types::{Credits, Movie, MovieDetails};
    use std::time::Duration;

    /// Canned source: `search` echoes the query into the title, details for id
    /// "missing" fail, credits always fail.
    pub(crate) struct FakeSource;

    pub(crate) fn movie(id: &str, title: &str) -> Movie {
        Movie {
            id: id.into(),
            title: title.into(),
            poster_path: None,
            vote_average: 5.0,
            release_date: None,
            overview: None,
        }
    }

    impl MovieSource for FakeSource {
        fn popular(&self, page: u32) -> Result<MoviePage, ApiError> {
            Ok(MoviePage {
                page,
                results: vec![movie(&format!("p{page}"), "Popular")],
                total_pages: 2,
            })
        }

        fn search(&self, query: &str, page: u32) -> Result<MoviePage, ApiError> {
            Ok(MoviePage {
                page,
                results: vec![movie(&format!("s{page}"), query)],
                total_pages: 1,
            })
        }

        fn details(&self, id: &str) -> Result<MovieDetails, ApiError> {
            if id == "missing" {
                return Err(ApiError::Status {
                    status: 404,
                    url: format!("/movie/{id}"),
                });
            }
            Ok(MovieDetails {
                id: id.into(),
                title: "Fake".into(),
                overview: None,
                poster_path: None,
                backdrop_path: None,
                vote_average: 0.0,
                release_date: None,
                runtime: None,
                genres: Vec::new(),
            })
        }

        fn similar(&self, _id: &str) -> Result<MoviePage, ApiError> {
            Ok(MoviePage {
                page: 1,
                results: Vec::new(),
                total_pages: 1,
            })
        }

        fn credits(&self, _id: &str) -> Result<Credits, ApiError> {
            Err(ApiError::Network("connection reset".into()))
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn page_request_routes_by_listing() {
        let f = Fetcher::new(Arc::new(FakeSource));
        f.request_page(PageRequest {
            listing: Listing::Search("alien".into()),
            page: 1,
            generation: 7,
        });
        match f.wait(WAIT) {
            Some(FetchMsg::Page { req, result }) => {
                assert_eq!(req.generation, 7);
                assert_eq!(result.unwrap().results[0].title, "alien");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detail_request_yields_three_independent_parts() {
        let f = Fetcher::new(Arc::new(FakeSource));
        f.request_detail("42");
        let mut details_ok = false;
        let mut similar_ok = false;
        let mut credits_failed = false;
        for _ in 0..3 {
            match f.wait(WAIT) {
                Some(FetchMsg::Detail { id, part }) => {
                    assert_eq!(id, "42");
                    match part {
                        DetailPart::Details(r) => details_ok = r.is_ok(),
                        DetailPart::Similar(r) => similar_ok = r.is_ok(),
                        DetailPart::Credits(r) => credits_failed = r.is_err(),
                    }
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(details_ok && similar_ok && credits_failed);
    }

    #[test]
    fn drain_on_idle_channel_is_empty() {
        let f = Fetcher::new(Arc::new(FakeSource));
        assert!(f.drain(8).is_empty());
    }
}
