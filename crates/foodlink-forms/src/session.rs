//! Per-session security context
//!
//! A `Session` is created once when the page (or CLI run) starts and is
//! dropped when it ends. It owns the CSRF token and the rate-limit history
//! that every form in the session shares.

use crate::clock::{Clock, SystemClock};
use crate::config::SecurityConfig;
use crate::rate_limit::RateLimiter;
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

/// Random bytes in a CSRF token
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Hex-encoded random token sent as `X-CSRF-Token`
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a fresh token from the thread RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; CSRF_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CsrfToken({}…)", &self.0[..8])
    }
}

/// Shared state for one session
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: SecurityConfig,
    csrf_token: CsrfToken,
    rate_limiter: RateLimiter,
}

impl Session {
    /// Start a session on the system clock
    pub fn new(config: SecurityConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Start a session on a caller-supplied clock
    pub fn with_clock(config: SecurityConfig, clock: Arc<dyn Clock>) -> Self {
        let rate_limiter = RateLimiter::new(&config, clock);
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            csrf_token: CsrfToken::generate(),
            config,
            rate_limiter,
        };
        tracing::debug!(session_id = %session.id, "Session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// The token fixed for this session's lifetime
    pub fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Drop all rate-limit history
    pub async fn end(&self) {
        self.rate_limiter.reset().await;
        tracing::debug!(session_id = %self.id, "Session ended");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SecurityConfig::default())
    }
}
