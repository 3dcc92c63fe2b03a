// src/app/store/mod.rs
//! Application state: three independent slices updated by pure reducers.
//!
//! ```text
//! Action ──→ reduce(state, action) ──→ State ──→ views
//!                     │
//!                     └──→ persistence effect (theme / favorites only)
//! ```
//!
//! `Store` owns the snapshot and the storage port. Reducers never touch storage;
//! the store fires the write after a mutating reducer has produced the new state.

mod auth;
mod favorites;
mod theme;

pub use auth::{AuthAction, AuthReducer, AuthState};
pub use favorites::{FavoritesAction, FavoritesReducer, FavoritesState};
pub use theme::{ThemeAction, ThemeReducer, ThemeState};

use tracing::debug;

use crate::app::prefs;
use crate::app::storage::KeyValueStore;
use crate::app::types::{Movie, User};

/// Pure state transition: `(State, Action) -> State`.
pub trait Reducer {
    type State;
    type Action;

    fn reduce(state: Self::State, action: Self::Action) -> Self::State;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub theme: ThemeState,
    pub auth: AuthState,
    pub favorites: FavoritesState,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Theme(ThemeAction),
    Auth(AuthAction),
    Favorites(FavoritesAction),
}

pub struct RootReducer;

impl Reducer for RootReducer {
    type State = AppState;
    type Action = Action;

    fn reduce(state: Self::State, action: Self::Action) -> Self::State {
        let AppState {
            theme,
            auth,
            favorites,
        } = state;
        match action {
            Action::Theme(a) => AppState {
                theme: ThemeReducer::reduce(theme, a),
                auth,
                favorites,
            },
            Action::Auth(a) => AppState {
                theme,
                auth: AuthReducer::reduce(auth, a),
                favorites,
            },
            Action::Favorites(a) => AppState {
                theme,
                auth,
                favorites: FavoritesReducer::reduce(favorites, a),
            },
        }
    }
}

/// Outcome of an optimistic favorite toggle, used to pick the notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

pub struct Store {
    state: AppState,
    storage: Box<dyn KeyValueStore>,
    revision: u64,
    theme_hydrated: bool,
    favorites_hydrated: bool,
}

impl Store {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            state: AppState::default(),
            storage,
            revision: 0,
            theme_hydrated: false,
            favorites_hydrated: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bumped on every state change; views repaint when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn storage_mut(&mut self) -> &mut dyn KeyValueStore {
        self.storage.as_mut()
    }

    /// Reduce, then persist the touched slice. Returns whether the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let persist = match &action {
            Action::Theme(ThemeAction::Toggle | ThemeAction::Set(_)) => Persist::Theme,
            Action::Favorites(FavoritesAction::Add(_) | FavoritesAction::Remove(_)) => {
                Persist::Favorites
            }
            _ => Persist::Nothing,
        };
        debug!("dispatch {:?}", action_name(&action));

        let next = RootReducer::reduce(self.state.clone(), action);
        let changed = next != self.state;
        self.state = next;
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }

        match persist {
            // Set(x) with x unchanged still writes: a first explicit choice must stick.
            Persist::Theme => prefs::save_theme(self.storage.as_mut(), self.state.theme.dark_mode),
            Persist::Favorites if changed => {
                prefs::save_favorites(self.storage.as_mut(), &self.state.favorites.movies)
            }
            _ => {}
        }
        changed
    }

    // ---- theme ----
    pub fn toggle_theme(&mut self) {
        self.dispatch(Action::Theme(ThemeAction::Toggle));
    }

    pub fn set_theme(&mut self, dark: bool) {
        self.dispatch(Action::Theme(ThemeAction::Set(dark)));
    }

    pub fn is_dark(&self) -> bool {
        self.state.theme.dark_mode
    }

    /// Startup hydration; only the first call has an effect.
    pub fn initialize_theme(&mut self, system_prefers_dark: bool) {
        if self.theme_hydrated {
            return;
        }
        self.theme_hydrated = true;
        let dark = prefs::load_theme(self.storage.as_ref(), system_prefers_dark);
        self.dispatch(Action::Theme(ThemeAction::Initialize(dark)));
    }

    // ---- favorites ----
    pub fn add_favorite(&mut self, movie: Movie) -> bool {
        self.dispatch(Action::Favorites(FavoritesAction::Add(movie)))
    }

    pub fn remove_favorite(&mut self, id: &str) -> bool {
        self.dispatch(Action::Favorites(FavoritesAction::Remove(id.to_string())))
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.state.favorites.contains(id)
    }

    pub fn favorites(&self) -> &[Movie] {
        &self.state.favorites.movies
    }

    pub fn toggle_favorite(&mut self, movie: &Movie) -> FavoriteToggle {
        if self.is_favorite(&movie.id) {
            self.remove_favorite(&movie.id);
            FavoriteToggle::Removed
        } else {
            self.add_favorite(movie.clone());
            FavoriteToggle::Added
        }
    }

    pub fn initialize_favorites(&mut self) {
        if self.favorites_hydrated {
            return;
        }
        self.favorites_hydrated = true;
        let movies = prefs::load_favorites(self.storage.as_ref());
        self.dispatch(Action::Favorites(FavoritesAction::Initialize(movies)));
    }

    // ---- auth shadow ----
    pub fn login_start(&mut self) {
        self.dispatch(Action::Auth(AuthAction::LoginStart));
    }

    pub fn login_success(&mut self, user: User) {
        self.dispatch(Action::Auth(AuthAction::LoginSuccess(user)));
    }

    pub fn login_failure(&mut self, error: impl Into<String>) {
        self.dispatch(Action::Auth(AuthAction::LoginFailure(error.into())));
    }

    pub fn logout(&mut self) {
        self.dispatch(Action::Auth(AuthAction::Logout));
    }
}

enum Persist {
    Nothing,
    Theme,
    Favorites,
}

// Keeps movie payloads out of debug logs.
fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Theme(ThemeAction::Toggle) => "theme/toggle",
        Action::Theme(ThemeAction::Set(_)) => "theme/set",
        Action::Theme(ThemeAction::Initialize(_)) => "theme/initialize",
        Action::Auth(AuthAction::LoginStart) => "auth/loginStart",
        Action::Auth(AuthAction::LoginSuccess(_)) => "auth/loginSuccess",
        Action::Auth(AuthAction::LoginFailure(_)) => "auth/loginFailure",
        Action::Auth(AuthAction::Logout) => "auth/logout",
        Action::Favorites(FavoritesAction::Add(_)) => "favorites/add",
        Action::Favorites(FavoritesAction::Remove(_)) => "favorites/remove",
        Action::Favorites(FavoritesAction::Initialize(_)) => "favorites/initialize",
    }
}
