// src/app/search.rs
//! Trailing-edge debounce for the search box.

use std::time::{Duration, Instant};

/// Only the last keystroke inside the window fires, `delay` after it was typed.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
    last_emitted: Option<String>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            // the app opens on the popular listing
            last_emitted: Some(String::new()),
        }
    }

    /// Record raw input; restarts the timer.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.pending = Some((text.to_string(), now + self.delay));
    }

    /// Fires once the deadline has passed. Returns the normalised query
    /// (trimmed; empty means "popular"), or `None` if nothing is due or the
    /// query is unchanged since the last emit.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = matches!(&self.pending, Some((_, at)) if now >= *at);
        if !due {
            return None;
        }
        let (raw, _) = self.pending.take()?;
        let query = normalize_query(&raw);
        if self.last_emitted.as_deref() == Some(query.as_str()) {
            return None;
        }
        self.last_emitted = Some(query.clone());
        Some(query)
    }

    /// When the UI should wake up next to call `poll`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn only_the_last_input_fires() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(500 * MS);
        d.input("b", t0);
        d.input("ba", t0 + 100 * MS);
        d.input("bat", t0 + 200 * MS);

        assert_eq!(d.poll(t0 + 600 * MS), None);
        assert_eq!(d.poll(t0 + 700 * MS).as_deref(), Some("bat"));
        assert_eq!(d.poll(t0 + 900 * MS), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn emitted_query_is_trimmed() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(10 * MS);
        d.input("  batman ", t0);
        assert_eq!(d.poll(t0 + 10 * MS).as_deref(), Some("batman"));
    }

    #[test]
    fn whitespace_only_means_popular() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(10 * MS);
        d.input("x", t0);
        d.poll(t0 + 20 * MS);
        d.input("   ", t0 + 30 * MS);
        assert_eq!(d.poll(t0 + 40 * MS).as_deref(), Some(""));
    }

    #[test]
    fn unchanged_query_is_not_refired() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(10 * MS);
        d.input("dune", t0);
        assert!(d.poll(t0 + 10 * MS).is_some());
        d.input("dune ", t0 + 20 * MS);
        assert_eq!(d.poll(t0 + 30 * MS), None);
    }

    #[test]
    fn deadline_tracks_last_keystroke() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(500 * MS);
        assert_eq!(d.next_deadline(), None);
        d.input("a", t0);
        d.input("ab", t0 + 50 * MS);
        assert_eq!(d.next_deadline(), Some(t0 + 550 * MS));
    }
}
