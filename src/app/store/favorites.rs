use itertools::Itertools;

use super::Reducer;
use crate::app::types::Movie;

/// Ordered favorites; ids are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FavoritesState {
    pub movies: Vec<Movie>,
}

impl FavoritesState {
    pub fn contains(&self, id: &str) -> bool {
        self.movies.iter().any(|m| m.id == id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FavoritesAction {
    Add(Movie),
    Remove(String),
    Initialize(Vec<Movie>),
}

pub struct FavoritesReducer;

impl Reducer for FavoritesReducer {
    type State = FavoritesState;
    type Action = FavoritesAction;

    fn reduce(mut state: Self::State, action: Self::Action) -> Self::State {
        match action {
            FavoritesAction::Add(movie) => {
                if !state.contains(&movie.id) {
                    state.movies.push(movie);
                }
                state
            }
            FavoritesAction::Remove(id) => {
                state.movies.retain(|m| m.id != id);
                state
            }
            FavoritesAction::Initialize(movies) => FavoritesState {
                // first occurrence wins if an old file carried duplicates
                movies: movies.into_iter().unique_by(|m| m.id.clone()).collect(),
            },
        }
    }
}
