//! Monotonic request tokens for report refreshes.
//!
//! # Responsibility
//! - Let callers that refresh reports off-thread discard stale results.
//!
//! # Invariants
//! - Tokens are strictly increasing per sequence.
//! - `LatestReport` only accepts a result carrying the newest issued token,
//!   so a slow response for an old selection never overwrites a newer one.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Handle identifying one report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues strictly increasing request tokens.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token that supersedes every previously issued one.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` is still the newest issued token.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Holds the most recent accepted report result.
#[derive(Debug)]
pub struct LatestReport<T> {
    sequence: RequestSequence,
    value: Mutex<Option<(RequestToken, T)>>,
}

impl<T> Default for LatestReport<T> {
    fn default() -> Self {
        Self {
            sequence: RequestSequence::new(),
            value: Mutex::new(None),
        }
    }
}

impl<T: Clone> LatestReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a refresh; any earlier in-flight refresh becomes stale.
    pub fn begin(&self) -> RequestToken {
        self.sequence.issue()
    }

    /// Stores `value` if `token` is still current. Returns whether it was kept.
    pub fn publish(&self, token: RequestToken, value: T) -> bool {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.sequence.is_current(token) {
            debug!(
                "event=report_publish module=report status=stale token={}",
                token.value()
            );
            return false;
        }
        *slot = Some((token, value));
        true
    }

    /// Latest accepted result, if any.
    pub fn latest(&self) -> Option<T> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, value)| value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{LatestReport, RequestSequence};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn tokens_are_strictly_increasing() {
        let sequence = RequestSequence::new();
        let first = sequence.issue();
        let second = sequence.issue();
        assert!(second > first);
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }

    #[test]
    fn stale_result_never_overwrites_newer_request() {
        let report = LatestReport::new();
        let old = report.begin();
        let fresh = report.begin();

        assert!(report.publish(fresh, "2024-01-11"));
        assert!(!report.publish(old, "2024-01-10"));
        assert_eq!(report.latest(), Some("2024-01-11"));
    }

    #[test]
    fn stale_result_is_dropped_even_when_it_arrives_first() {
        let report = LatestReport::new();
        let old = report.begin();
        let fresh = report.begin();

        assert!(!report.publish(old, 1));
        assert_eq!(report.latest(), None);
        assert!(report.publish(fresh, 2));
        assert_eq!(report.latest(), Some(2));
    }

    #[test]
    fn only_the_last_issued_token_wins_across_threads() {
        let report = Arc::new(LatestReport::new());
        let tokens: Vec<_> = (0..8).map(|_| report.begin()).collect();
        let newest = *tokens.last().unwrap();

        let handles: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                let report = Arc::clone(&report);
                thread::spawn(move || report.publish(token, token.value()))
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|kept| *kept)
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(report.latest(), Some(newest.value()));
    }
}
