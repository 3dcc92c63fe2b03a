// src/app/detail.rs
//! Detail page state. Details, similar movies and credits load independently;
//! the page renders once details are in, the other two fill in or fail on their own.

use tracing::warn;

use crate::app::tmdb::ApiError;
use crate::app::types::{Credit, Credits, Movie, MovieDetails, MoviePage};

pub const CAST_LIMIT: usize = 10;
pub const CREW_LIMIT: usize = 5;
pub const SIMILAR_LIMIT: usize = 5;
pub const CREW_JOBS: [&str; 3] = ["Director", "Writer", "Producer"];

#[derive(Clone, Debug, PartialEq)]
pub enum Slot<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Slot<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    fn from_result<U>(
        what: &str,
        result: Result<U, ApiError>,
        map: impl FnOnce(U) -> T,
    ) -> Self {
        match result {
            Ok(v) => Self::Ready(map(v)),
            Err(e) => {
                warn!("{what} fetch failed: {e}");
                Self::Failed(e.to_string())
            }
        }
    }
}

/// Cast and the few crew roles the page lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreditsView {
    pub cast: Vec<Credit>,
    pub crew: Vec<Credit>,
}

impl From<Credits> for CreditsView {
    fn from(c: Credits) -> Self {
        Self {
            cast: c.cast.into_iter().take(CAST_LIMIT).collect(),
            crew: c
                .crew
                .into_iter()
                .filter(|m| m.job.as_deref().is_some_and(|j| CREW_JOBS.contains(&j)))
                .take(CREW_LIMIT)
                .collect(),
        }
    }
}

/// One finished background fetch for the detail page.
#[derive(Debug)]
pub enum DetailPart {
    Details(Result<MovieDetails, ApiError>),
    Similar(Result<MoviePage, ApiError>),
    Credits(Result<Credits, ApiError>),
}

#[derive(Debug)]
pub struct DetailState {
    id: String,
    details: Slot<MovieDetails>,
    similar: Slot<Vec<Movie>>,
    credits: Slot<CreditsView>,
}

impl DetailState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: Slot::Loading,
            similar: Slot::Loading,
            credits: Slot::Loading,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn details(&self) -> &Slot<MovieDetails> {
        &self.details
    }

    pub fn similar(&self) -> &Slot<Vec<Movie>> {
        &self.similar
    }

    pub fn credits(&self) -> &Slot<CreditsView> {
        &self.credits
    }

    pub fn not_found(&self) -> bool {
        matches!(self.details, Slot::Failed(_))
    }

    /// Any of the three parts ended in an error.
    pub fn has_failure(&self) -> bool {
        self.not_found()
            || matches!(self.similar, Slot::Failed(_))
            || matches!(self.credits, Slot::Failed(_))
    }

    /// Results for a different movie are ignored.
    pub fn apply(&mut self, id: &str, part: DetailPart) -> bool {
        if id != self.id {
            return false;
        }
        match part {
            DetailPart::Details(r) => self.details = Slot::from_result("details", r, |d| d),
            DetailPart::Similar(r) => {
                self.similar = Slot::from_result("similar", r, |p| {
                    p.results.into_iter().take(SIMILAR_LIMIT).collect()
                })
            }
            DetailPart::Credits(r) => {
                self.credits = Slot::from_result("credits", r, CreditsView::from)
            }
        }
        true
    }
}
