// src/app/users.rs
//! Demo user directory backing the credentials sign-in and the register form.
//!
//! NOT a credential store: passwords are kept in plaintext, exactly as typed. It
//! exists so the app can be tried without an identity provider. Anything real
//! needs hashed credentials and a proper datastore.

use std::io;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::app::storage::{KeyValueStore, KEY_REGISTERED_USERS};

pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Plaintext. Demo only.
    pub password: String,
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already exists. Please use a different email.")]
    Duplicate { email: String },
    #[error("could not save the new account: {0}")]
    Storage(#[from] io::Error),
}

#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Field checks that run before anything is sent to the directory.
    pub fn validate(&self) -> Result<(), RegisterError> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(RegisterError::Validation("Please fill in all fields".into()));
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(RegisterError::Validation(
                "Please enter a valid email address".into(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(RegisterError::Validation("Passwords do not match".into()));
        }
        Ok(())
    }
}

/// Seeded demo account plus whatever was registered, persisted under
/// `registeredUsers` in the given key/value store.
pub struct UserDirectory {
    seeded: Vec<UserRecord>,
    registered: Vec<UserRecord>,
    storage: Box<dyn KeyValueStore>,
}

impl UserDirectory {
    pub fn open(storage: Box<dyn KeyValueStore>) -> Self {
        let registered = match storage.get(KEY_REGISTERED_USERS) {
            Some(raw) => serde_json::from_str::<Vec<UserRecord>>(&raw).unwrap_or_else(|e| {
                warn!("registered users are unreadable ({e}); starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Self {
            seeded: vec![UserRecord {
                id: "1".into(),
                name: "Test User".into(),
                email: DEMO_EMAIL.into(),
                password: DEMO_PASSWORD.into(),
            }],
            registered,
            storage,
        }
    }

    fn all(&self) -> impl Iterator<Item = &UserRecord> {
        self.seeded.iter().chain(self.registered.iter())
    }

    pub fn count(&self) -> usize {
        self.seeded.len() + self.registered.len()
    }

    pub fn exists(&self, email: &str) -> bool {
        let email = email.trim();
        self.all().any(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn find(&self, email: &str) -> Option<&UserRecord> {
        let email = email.trim();
        self.all().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Validate, reject duplicates, then append and persist. Nothing is kept
    /// in memory unless the write succeeded.
    pub fn register(&mut self, form: &RegistrationForm) -> Result<UserRecord, RegisterError> {
        form.validate()?;
        let email = form.email.trim().to_string();
        if self.exists(&email) {
            info!("registration rejected: email already registered");
            return Err(RegisterError::Duplicate { email });
        }

        let record = UserRecord {
            id: self.next_id(),
            name: form.name.trim().to_string(),
            email,
            password: form.password.clone(),
        };

        let mut next = self.registered.clone();
        next.push(record.clone());
        let json = serde_json::to_string(&next)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.storage.set(KEY_REGISTERED_USERS, &json)?;
        self.registered = next;

        info!("registered new demo account {}", record.id);
        Ok(record)
    }

    /// Plain comparison against the stored password.
    pub fn verify(&self, email: &str, password: &str) -> Option<&UserRecord> {
        self.find(email).filter(|u| u.password == password)
    }

    fn next_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("user_{millis}");
            if !self.all().any(|u| u.id == id) {
                return id;
            }
            millis += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::storage::{FileStore, MemoryStore};

    fn form(email: &str) -> RegistrationForm {
        RegistrationForm {
            name: "Ada".into(),
            email: email.into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        }
    }

    #[test]
    fn demo_account_is_seeded() {
        let dir = UserDirectory::open(Box::new(MemoryStore::new()));
        assert!(dir.exists(DEMO_EMAIL));
        assert!(dir.verify(DEMO_EMAIL, DEMO_PASSWORD).is_some());
        assert!(dir.verify(DEMO_EMAIL, "nope").is_none());
        assert_eq!(dir.count(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected_without_write() {
        let handle = MemoryStore::new();
        let mut dir = UserDirectory::open(Box::new(handle.clone()));
        dir.register(&form("ada@example.com")).unwrap();
        let before = dir.count();
        let stored_before = handle.get(KEY_REGISTERED_USERS);

        let err = dir.register(&form("ada@example.com")).unwrap_err();
        assert!(matches!(err, RegisterError::Duplicate { .. }));
        assert_eq!(dir.count(), before);
        assert_eq!(handle.get(KEY_REGISTERED_USERS), stored_before);
    }

    #[test]
    fn seeded_email_counts_as_duplicate() {
        let handle = MemoryStore::new();
        let mut dir = UserDirectory::open(Box::new(handle.clone()));
        let err = dir.register(&form(DEMO_EMAIL)).unwrap_err();
        assert!(matches!(err, RegisterError::Duplicate { .. }));
        assert!(handle.is_empty());
    }

    #[test]
    fn validation_errors_are_reported_before_lookup() {
        let mut dir = UserDirectory::open(Box::new(MemoryStore::new()));

        let mut f = form("new@example.com");
        f.name.clear();
        let err = dir.register(&f).unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all fields");

        let mut f = form("new@example.com");
        f.confirm_password = "other".into();
        assert_eq!(dir.register(&f).unwrap_err().to_string(), "Passwords do not match");

        let f = form("not-an-email");
        assert!(matches!(dir.register(&f), Err(RegisterError::Validation(_))));
        assert_eq!(dir.count(), 1);
    }

    #[test]
    fn registered_users_survive_reopen_with_file_store() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(tmp.path()).unwrap();
            let mut dir = UserDirectory::open(Box::new(store));
            let rec = dir.register(&form("grace@example.com")).unwrap();
            assert!(rec.id.starts_with("user_"));
        }
        let store = FileStore::open(tmp.path()).unwrap();
        let dir = UserDirectory::open(Box::new(store));
        assert!(dir.exists("GRACE@example.com"));
        assert!(dir.verify("grace@example.com", "hunter22").is_some());
    }

    #[test]
    fn memory_directory_forgets_on_restart() {
        let mut dir = UserDirectory::open(Box::new(MemoryStore::new()));
        dir.register(&form("tmp@example.com")).unwrap();
        let fresh = UserDirectory::open(Box::new(MemoryStore::new()));
        assert!(!fresh.exists("tmp@example.com"));
    }

    #[test]
    fn ids_stay_unique_within_the_same_millisecond() {
        let mut dir = UserDirectory::open(Box::new(MemoryStore::new()));
        let a = dir.register(&form("a@example.com")).unwrap();
        let b = dir.register(&form("b@example.com")).unwrap();
        assert_ne!(a.id, b.id);
    }
}
