// src/app/prefs.rs
//! Serialization of persisted slices. Each value lives under its own storage key.

use tracing::warn;

use crate::app::storage::{KeyValueStore, KEY_FAVORITES, KEY_THEME};
use crate::app::types::Movie;

pub const fn theme_to_str(dark: bool) -> &'static str {
    if dark {
        "dark"
    } else {
        "light"
    }
}

pub fn theme_from_str(s: &str) -> Option<bool> {
    match s.trim() {
        "dark" => Some(true),
        "light" => Some(false),
        _ => None,
    }
}

/// Stored preference wins; otherwise the system preference.
pub fn load_theme(storage: &dyn KeyValueStore, system_prefers_dark: bool) -> bool {
    storage
        .get(KEY_THEME)
        .and_then(|v| {
            let parsed = theme_from_str(&v);
            if parsed.is_none() {
                warn!("ignoring unknown stored theme `{}`", v.trim());
            }
            parsed
        })
        .unwrap_or(system_prefers_dark)
}

pub fn save_theme(storage: &mut dyn KeyValueStore, dark: bool) {
    if let Err(e) = storage.set(KEY_THEME, theme_to_str(dark)) {
        warn!("failed to persist theme: {e}");
    }
}

pub fn load_favorites(storage: &dyn KeyValueStore) -> Vec<Movie> {
    let Some(raw) = storage.get(KEY_FAVORITES) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Movie>>(&raw) {
        Ok(list) => list,
        Err(e) => {
            warn!("stored favorites are unreadable ({e}); starting empty");
            Vec::new()
        }
    }
}

pub fn save_favorites(storage: &mut dyn KeyValueStore, movies: &[Movie]) {
    let json = match serde_json::to_string(movies) {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to serialize favorites: {e}");
            return;
        }
    };
    if let Err(e) = storage.set(KEY_FAVORITES, &json) {
        warn!("failed to persist favorites: {e}");
    }
}
