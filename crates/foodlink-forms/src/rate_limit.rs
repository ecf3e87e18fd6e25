//! Sliding-window rate limiting per submitter

use crate::clock::Clock;
use crate::config::SecurityConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Identifier used when a form carries neither email nor phone
pub const ANONYMOUS: &str = "anonymous";

/// Rate limiter keyed by submitter identifier.
///
/// Keeps the accepted timestamps for each identifier and prunes the ones
/// older than the window on every call. Rejected attempts are never recorded,
/// so hammering the form does not push the window forward.
///
/// The identifier comes straight from form data, so a client that varies its
/// email per request is never limited. There is nothing better to key on at
/// this layer.
pub struct RateLimiter {
    max_submissions: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    history: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: &SecurityConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_submissions: config.max_submissions,
            window: config.window(),
            clock,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt if the identifier still has room in the window.
    ///
    /// Returns `false` without recording anything when the window is full.
    /// Identifiers whose entries have all expired are dropped on the way.
    pub async fn check(&self, identifier: &str) -> bool {
        let now = self.clock.now();
        let window = self.window;
        let mut history = self.history.lock().await;

        history.retain(|_, stamps| {
            stamps.retain(|t| now.duration_since(*t) < window);
            !stamps.is_empty()
        });

        let recent = history.entry(identifier.to_string()).or_default();
        if recent.len() >= self.max_submissions {
            debug!(identifier, count = recent.len(), "Rate limit window full");
            return false;
        }

        recent.push(now);
        true
    }

    /// Fill the identifier's window so further attempts are rejected until
    /// its oldest entry expires.
    pub async fn saturate(&self, identifier: &str) {
        let now = self.clock.now();
        let mut history = self.history.lock().await;

        let mut recent = self.prune(history.remove(identifier).unwrap_or_default(), now);
        while recent.len() < self.max_submissions {
            recent.push(now);
        }
        history.insert(identifier.to_string(), recent);
    }

    /// Current limit status for an identifier. Does not record an attempt.
    pub async fn status(&self, identifier: &str) -> RateLimitStatus {
        let now = self.clock.now();
        let history = self.history.lock().await;

        let recent: Vec<Instant> = history
            .get(identifier)
            .map(|stamps| {
                stamps
                    .iter()
                    .copied()
                    .filter(|t| now.duration_since(*t) < self.window)
                    .collect()
            })
            .unwrap_or_default();

        let remaining = self.max_submissions.saturating_sub(recent.len());
        let reset_in = if remaining == 0 {
            recent
                .first()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
        } else {
            None
        };

        RateLimitStatus {
            allowed: remaining > 0,
            remaining,
            reset_in,
        }
    }

    /// Forget every identifier. Called when the session ends.
    pub async fn reset(&self) {
        self.history.lock().await.clear();
    }

    /// Number of identifiers currently tracked
    pub async fn tracked(&self) -> usize {
        self.history.lock().await.len()
    }

    fn prune(&self, stamps: Vec<Instant>, now: Instant) -> Vec<Instant> {
        stamps
            .into_iter()
            .filter(|t| now.duration_since(*t) < self.window)
            .collect()
    }
}

/// Rate limit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether the next attempt would be accepted
    pub allowed: bool,
    /// Remaining submissions in the current window
    pub remaining: usize,
    /// Time until the oldest entry leaves the window, when full
    pub reset_in: Option<Duration>,
}
