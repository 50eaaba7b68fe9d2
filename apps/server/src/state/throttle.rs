//! # Login Throttle
//!
//! Counts failed logins per (email, ip) key and locks the key out once
//! `max_attempts` is reached.
//!
//! ```text
//! failure ──► hit(key) ──► attempts += 1 (window starts on first failure)
//!                               │
//! login  ──► locked_for(key) ──┤ attempts >= max and window open → Some(secs)
//!                               └► otherwise → None
//! success ──► clear(key)
//! ```
//!
//! Entries live in a bounded `moka` cache: they expire `decay` after the
//! last failure, and the least used keys are evicted past `MAX_KEYS`.

use std::time::{Duration, Instant};

use moka::sync::Cache;

/// Distinct (email, ip) keys tracked at once.
const MAX_KEYS: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
struct Attempts {
    count: u32,
    first_failure: Instant,
}

/// Shared across handlers; clones point at the same cache.
#[derive(Clone)]
pub struct LoginThrottle {
    attempts: Cache<String, Attempts>,
    max_attempts: u32,
    decay: Duration,
}

impl std::fmt::Debug for LoginThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginThrottle")
            .field("tracked", &self.attempts.entry_count())
            .field("max_attempts", &self.max_attempts)
            .field("decay", &self.decay)
            .finish()
    }
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, decay: Duration) -> Self {
        Self::with_capacity(max_attempts, decay, MAX_KEYS)
    }

    fn with_capacity(max_attempts: u32, decay: Duration, capacity: u64) -> Self {
        LoginThrottle {
            attempts: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(decay)
                .build(),
            max_attempts,
            decay,
        }
    }

    /// Throttle key: lowercased email plus client address.
    pub fn key(email: &str, ip: &str) -> String {
        format!("{}|{}", email.trim().to_lowercase(), ip)
    }

    /// Seconds left before `key` may try again, or `None` when allowed.
    pub fn locked_for(&self, key: &str) -> Option<u64> {
        self.locked_for_at(key, Instant::now())
    }

    /// Records a failed attempt.
    pub fn hit(&self, key: &str) {
        self.hit_at(key, Instant::now());
    }

    /// Forgets `key` after a successful login.
    pub fn clear(&self, key: &str) {
        self.attempts.invalidate(key);
    }

    fn locked_for_at(&self, key: &str, now: Instant) -> Option<u64> {
        let attempts = self.attempts.get(key)?;

        let elapsed = now.saturating_duration_since(attempts.first_failure);
        if elapsed >= self.decay {
            self.attempts.invalidate(key);
            return None;
        }

        if attempts.count < self.max_attempts {
            return None;
        }

        // round up so a lockout never reports 0 seconds
        let remaining = self.decay - elapsed;
        Some(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0))
    }

    fn hit_at(&self, key: &str, now: Instant) {
        let decay = self.decay;
        self.attempts
            .entry(key.to_string())
            .and_upsert_with(|existing| match existing.map(|e| e.into_value()) {
                Some(a) if now.saturating_duration_since(a.first_failure) < decay => Attempts {
                    count: a.count.saturating_add(1),
                    first_failure: a.first_failure,
                },
                _ => Attempts {
                    count: 1,
                    first_failure: now,
                },
            });
    }
}
