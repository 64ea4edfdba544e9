//! Fixed-window request limiter keyed by client address.
//!
//! All counters share one window. When it elapses every counter resets at
//! once, so a client can burst up to twice the limit across a boundary.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("Too many requests, retry after {}s", retry_after.as_secs())]
    Exceeded { retry_after: Duration },
}

struct Window {
    started: Instant,
    counts: HashMap<String, u32>,
}

pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                counts: HashMap::new(),
            }),
        }
    }

    pub fn check(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut state = self.state.lock();

        let elapsed = now.saturating_duration_since(state.started);
        if elapsed >= self.window {
            state.started = now;
            state.counts.clear();
        }

        let count = state.counts.entry(key.to_string()).or_insert(0);
        if *count >= self.max_requests {
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(state.started));
            return Err(RateLimitError::Exceeded { retry_after });
        }
        *count += 1;
        Ok(())
    }
}
