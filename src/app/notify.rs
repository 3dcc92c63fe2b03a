// src/app/notify.rs
//! Transient toasts.

use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, kind: ToastKind, text: impl Into<String>, now: Instant) {
        self.items.push(Toast {
            kind,
            text: text.into(),
            expires_at: now + TOAST_TTL,
        });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Success, text, Instant::now());
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Info, text, Instant::now());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Error, text, Instant::now());
    }

    /// Drop expired toasts; returns the earliest remaining expiry.
    pub fn prune(&mut self, now: Instant) -> Option<Instant> {
        self.items.retain(|t| t.expires_at > now);
        self.items.iter().map(|t| t.expires_at).min()
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}
