// src/app/session.rs
//! Session provider and route gating.
//!
//! The session is the authority on who is signed in; the store's auth slice only
//! mirrors it (see `AuthSync`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::storage::{KeyValueStore, KEY_SESSION};
use crate::app::store::Store;
use crate::app::types::User;
use crate::app::users::UserDirectory;

pub const SESSION_MAX_AGE_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Identity as the provider reports it; any field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Invalid email or password")]
    InvalidCredentials,
}

/// Verifies credentials. Returns `None` when they do not match.
pub trait AuthProvider {
    fn authorize(&self, email: &str, password: &str) -> Option<SessionUser>;
}

impl AuthProvider for UserDirectory {
    fn authorize(&self, email: &str, password: &str) -> Option<SessionUser> {
        self.verify(email, password).map(|u| SessionUser {
            id: Some(u.id.clone()),
            name: Some(u.name.clone()),
            email: Some(u.email.clone()),
        })
    }
}

pub struct SessionManager {
    status: SessionStatus,
    session: Option<Session>,
    revision: u64,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Loading,
            session: None,
            revision: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn set(&mut self, session: Option<Session>) {
        self.status = if session.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        };
        self.session = session;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Resolve the `Loading` state from whatever was persisted last run.
    pub fn restore(&mut self, storage: &mut dyn KeyValueStore, now: DateTime<Utc>) {
        let restored = storage
            .get(KEY_SESSION)
            .and_then(|raw| match serde_json::from_str::<Session>(&raw) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("stored session is unreadable ({e}); signing out");
                    None
                }
            })
            .filter(|s| {
                let live = !s.is_expired(now);
                if !live {
                    info!("stored session expired at {}", s.expires_at);
                }
                live
            });
        if restored.is_none() {
            if let Err(e) = storage.remove(KEY_SESSION) {
                warn!("failed to clear stored session: {e}");
            }
        }
        debug!("session restore -> authenticated={}", restored.is_some());
        self.set(restored);
    }

    pub fn sign_in(
        &mut self,
        provider: &dyn AuthProvider,
        storage: &mut dyn KeyValueStore,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let Some(mut user) = provider.authorize(email.trim(), password) else {
            info!("sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        };
        if user.id.as_deref().map_or(true, str::is_empty) {
            user.id = Some(format!("user_{}", now.timestamp_millis()));
        }

        let session = Session {
            user,
            issued_at: now,
            expires_at: now + Duration::days(SESSION_MAX_AGE_DAYS),
        };
        match serde_json::to_string(&session) {
            Ok(json) => {
                if let Err(e) = storage.set(KEY_SESSION, &json) {
                    warn!("failed to persist session: {e}");
                }
            }
            Err(e) => warn!("failed to serialize session: {e}"),
        }
        info!("signed in");
        self.set(Some(session));
        Ok(())
    }

    pub fn sign_out(&mut self, storage: &mut dyn KeyValueStore) {
        if let Err(e) = storage.remove(KEY_SESSION) {
            warn!("failed to clear stored session: {e}");
        }
        info!("signed out");
        self.set(None);
    }

    /// Drop the session once it has outlived its max age.
    pub fn expire_if_needed(&mut self, storage: &mut dyn KeyValueStore, now: DateTime<Utc>) {
        if self.session.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.sign_out(storage);
        }
    }
}

/// Shadow identity with the defaults the views expect.
pub fn shadow_user(user: &SessionUser) -> User {
    User {
        id: user
            .id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("user_{}", Utc::now().timestamp_millis())),
        name: user
            .name
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "User".to_string()),
        email: user.email.clone().unwrap_or_default(),
    }
}

/// Mirrors session changes into the store's auth slice, once per session revision.
#[derive(Default)]
pub struct AuthSync {
    seen_revision: Option<u64>,
}

impl AuthSync {
    pub fn sync(&mut self, session: &SessionManager, store: &mut Store) {
        if self.seen_revision == Some(session.revision()) {
            return;
        }
        self.seen_revision = Some(session.revision());
        match (session.status(), session.session()) {
            (SessionStatus::Authenticated, Some(s)) => store.login_success(shadow_user(&s.user)),
            (SessionStatus::Unauthenticated, _) => store.logout(),
            _ => {}
        }
    }
}

// ---- routes ----
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Favorites,
    Movie(String),
    Login,
    Register,
}

impl Route {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Render,
    Placeholder,
    Redirect(Route),
}

pub fn gate(status: SessionStatus, route: &Route) -> Gate {
    if route.is_public() {
        return Gate::Render;
    }
    match status {
        SessionStatus::Loading => Gate::Placeholder,
        SessionStatus::Unauthenticated => Gate::Redirect(Route::Login),
        SessionStatus::Authenticated => Gate::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::storage::MemoryStore;
    use crate::app::users::{DEMO_EMAIL, DEMO_PASSWORD};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn directory() -> UserDirectory {
        UserDirectory::open(Box::new(MemoryStore::new()))
    }

    #[test]
    fn gate_covers_all_states() {
        let home = Route::Home;
        assert_eq!(gate(SessionStatus::Loading, &home), Gate::Placeholder);
        assert_eq!(
            gate(SessionStatus::Unauthenticated, &home),
            Gate::Redirect(Route::Login)
        );
        assert_eq!(gate(SessionStatus::Authenticated, &home), Gate::Render);
        assert_eq!(
            gate(SessionStatus::Unauthenticated, &Route::Movie("1".into())),
            Gate::Redirect(Route::Login)
        );
        assert_eq!(gate(SessionStatus::Unauthenticated, &Route::Register), Gate::Render);
        assert_eq!(gate(SessionStatus::Loading, &Route::Login), Gate::Render);
    }

    #[test]
    fn starts_loading_and_restores_to_unauthenticated() {
        let mut storage = MemoryStore::new();
        let mut sm = SessionManager::new();
        assert_eq!(sm.status(), SessionStatus::Loading);
        sm.restore(&mut storage, now());
        assert_eq!(sm.status(), SessionStatus::Unauthenticated);
    }

    /// Reads work, writes and removes fail.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn remove(&mut self, _key: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn unreadable_session_on_read_only_storage_still_signs_out() {
        let mut inner = MemoryStore::new();
        inner.set(KEY_SESSION, "{not json").unwrap();
        let mut store = ReadOnlyStore(inner.clone());

        let mut mgr = SessionManager::new();
        mgr.restore(&mut store, now());
        assert_eq!(mgr.status(), SessionStatus::Unauthenticated);
        assert!(mgr.session().is_none());
        // removal failed, the record is still there
        assert_eq!(inner.get(KEY_SESSION).as_deref(), Some("{not json"));
    }

    #[test]
    fn sign_in_persists_and_restores() {
        let mut storage = MemoryStore::new();
        let dir = directory();
        let mut sm = SessionManager::new();
        sm.sign_in(&dir, &mut storage, DEMO_EMAIL, DEMO_PASSWORD, now())
            .unwrap();
        assert_eq!(sm.status(), SessionStatus::Authenticated);

        let mut next_run = SessionManager::new();
        next_run.restore(&mut storage, now() + Duration::days(1));
        assert_eq!(next_run.status(), SessionStatus::Authenticated);
        assert_eq!(
            next_run.session().unwrap().user.email.as_deref(),
            Some(DEMO_EMAIL)
        );
    }

    #[test]
    fn expired_session_is_discarded() {
        let mut storage = MemoryStore::new();
        let dir = directory();
        let mut sm = SessionManager::new();
        sm.sign_in(&dir, &mut storage, DEMO_EMAIL, DEMO_PASSWORD, now())
            .unwrap();

        let later = now() + Duration::days(SESSION_MAX_AGE_DAYS + 1);
        let mut next_run = SessionManager::new();
        next_run.restore(&mut storage, later);
        assert_eq!(next_run.status(), SessionStatus::Unauthenticated);
        assert!(storage.get(KEY_SESSION).is_none());

        sm.expire_if_needed(&mut storage, later);
        assert_eq!(sm.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn bad_credentials_and_blank_fields() {
        let mut storage = MemoryStore::new();
        let dir = directory();
        let mut sm = SessionManager::new();
        assert_eq!(
            sm.sign_in(&dir, &mut storage, "", "x", now()),
            Err(AuthError::MissingFields)
        );
        assert_eq!(
            sm.sign_in(&dir, &mut storage, DEMO_EMAIL, "wrong", now()),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(sm.status(), SessionStatus::Loading);
        assert!(storage.is_empty());
    }

    #[test]
    fn shadow_user_fills_defaults() {
        let u = shadow_user(&SessionUser {
            id: None,
            name: None,
            email: None,
        });
        assert!(u.id.starts_with("user_"));
        assert_eq!(u.name, "User");
        assert_eq!(u.email, "");
    }

    #[test]
    fn auth_sync_mirrors_session_once_per_revision() {
        let mut storage = MemoryStore::new();
        let dir = directory();
        let mut store = Store::new(Box::new(MemoryStore::new()));
        let mut sm = SessionManager::new();
        let mut sync = AuthSync::default();

        sync.sync(&sm, &mut store);
        assert!(!store.state().auth.is_authenticated);

        sm.sign_in(&dir, &mut storage, DEMO_EMAIL, DEMO_PASSWORD, now())
            .unwrap();
        sync.sync(&sm, &mut store);
        let auth = &store.state().auth;
        assert!(auth.is_authenticated);
        assert_eq!(auth.user.as_ref().unwrap().name, "Test User");

        let rev = store.revision();
        sync.sync(&sm, &mut store);
        assert_eq!(store.revision(), rev);

        sm.sign_out(&mut storage);
        sync.sync(&sm, &mut store);
        assert!(!store.state().auth.is_authenticated);
        assert!(store.state().auth.user.is_none());
    }
}
