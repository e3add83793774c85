//! A fixed-window rate limiter for the authentication endpoints.
//!
//! Requests are counted per client and path. The client is identified by the
//! first address in the `x-forwarded-for` header. The counts are held
//! in-memory, so limits reset when the server restarts and are not shared
//! between server instances.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// How often expired entries are removed from the store.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct RateLimitEntry {
    count: u32,
    resets_at: Instant,
}

/// Limits how many requests a client may make to a path within a time window.
///
/// The limiter is cheap to clone, all clones share the same request counts.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    /// Create a rate limiter that allows five requests per fifteen minutes,
    /// a sensible limit for log-in and registration attempts.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }
}

impl RateLimiter {
    /// Create a rate limiter that allows `max_requests` per `window` for each key.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Record a request for `key`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::TooManyRequests] if `key` has exceeded the maximum
    /// number of requests for the current window.
    pub fn check(&self, key: &str) -> Result<(), Error> {
        let now = Instant::now();
        let mut entries = self.lock_entries();

        match entries.get_mut(key) {
            Some(entry) if entry.resets_at > now => {
                if entry.count >= self.max_requests {
                    return Err(Error::TooManyRequests);
                }

                entry.count += 1;
            }
            _ => {
                entries.insert(
                    key.to_owned(),
                    RateLimitEntry {
                        count: 1,
                        resets_at: now + self.window,
                    },
                );
            }
        }

        Ok(())
    }

    /// Remove entries whose window has passed.
    pub fn sweep(&self) {
        let now = Instant::now();

        self.lock_entries().retain(|_, entry| entry.resets_at > now);
    }

    /// An async task that periodically removes expired entries so that the
    /// store does not grow without bound.
    pub async fn sweep_periodically(self) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);

        loop {
            interval.tick().await;
            self.sweep();
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        // A poisoned lock only means another thread panicked mid-update, the
        // counts are still usable.
        match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Middleware function that rejects clients that make too many requests to the
/// same path within the rate limiter's window.
pub async fn rate_limit_guard(
    State(rate_limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .unwrap_or("unknown");
    let key = format!("{}:{}", client, request.uri().path());

    if let Err(error) = rate_limiter.check(&key) {
        tracing::warn!("Rate limit exceeded for {key}");
        return error.into_response();
    }

    next.run(request).await
}
