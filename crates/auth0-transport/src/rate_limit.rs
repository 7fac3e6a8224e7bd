//! Per-route rate limiting.
//!
//! Every distinct `(method, path)` pair an application calls gets its own token
//! bucket, created lazily by the [`RateLimiterRegistry`]. Rate and burst are
//! configured once for the whole registry and can be changed at runtime; the
//! change applies to buckets that already exist.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{
    error::{TransportError, TransportResult},
    transport::Method,
};

/// Rate and burst shared by every limiter in a registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Steady-state requests per second. `f64::INFINITY` disables limiting.
    pub rate: f64,

    /// Requests allowed back to back before the steady rate applies.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 2.0,
            burst: 5,
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with the given rate and burst.
    pub fn new(rate: f64, burst: u32) -> Self {
        Self { rate, burst }
    }

    /// A configuration that never throttles.
    pub fn unlimited() -> Self {
        Self {
            rate: f64::INFINITY,
            burst: 1,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TransportResult<()> {
        validate_rate(self.rate)?;
        validate_burst(self.burst)
    }
}

/// Slowest accepted rate: one request every 1000 seconds.
const MIN_RATE: f64 = 1e-3;

/// Upper bound on a single reservation's wait.
const MAX_WAIT: Duration = Duration::from_secs(3600);

fn validate_rate(rate: f64) -> TransportResult<()> {
    if rate.is_nan() || rate < MIN_RATE {
        return Err(TransportError::config(format!(
            "rate limit must be at least {MIN_RATE}/s, got {rate}"
        )));
    }
    Ok(())
}

fn validate_burst(burst: u32) -> TransportResult<()> {
    if burst == 0 {
        return Err(TransportError::config("burst must be at least 1"));
    }
    Ok(())
}

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    // May go negative: outstanding reservations are paid back by refill.
    tokens: f64,
    refill_rate: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(config: RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst);
        Self {
            capacity,
            tokens: capacity,
            refill_rate: config.rate,
            last_update: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_update = now;
    }

    fn is_unlimited(&self) -> bool {
        self.refill_rate.is_infinite()
    }
}

/// A token bucket limiter for one route.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(config)),
        }
    }

    /// Current steady-state rate in requests per second.
    pub fn rate(&self) -> f64 {
        self.bucket.lock().refill_rate
    }

    /// Current burst size.
    pub fn burst(&self) -> u32 {
        // capacity always comes from a u32
        self.bucket.lock().capacity as u32
    }

    /// Change the refill rate. Tokens accrued so far are settled at the old rate.
    pub fn set_rate(&self, rate: f64) {
        let mut bucket = self.bucket.lock();
        bucket.refill(Instant::now());
        bucket.refill_rate = rate;
    }

    /// Change the burst size. Excess tokens are dropped on the next refill.
    pub fn set_burst(&self, burst: u32) {
        let mut bucket = self.bucket.lock();
        bucket.refill(Instant::now());
        bucket.capacity = f64::from(burst);
        bucket.tokens = bucket.tokens.min(bucket.capacity);
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock();
        if bucket.is_unlimited() {
            return true;
        }
        bucket.refill(Instant::now());
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return true;
        }
        false
    }

    /// Reserve a token and return how long the caller must wait before using it.
    ///
    /// The reservation is taken immediately, so concurrent callers queue up
    /// behind each other instead of racing for the same refill.
    pub fn reserve(&self) -> Duration {
        let mut bucket = self.bucket.lock();
        if bucket.is_unlimited() {
            return Duration::ZERO;
        }
        bucket.refill(Instant::now());
        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            return Duration::ZERO;
        }
        // An unvalidated rate near zero overflows Duration.
        Duration::try_from_secs_f64(-bucket.tokens / bucket.refill_rate)
            .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT))
    }

    /// Reserve a token and sleep until it may be used.
    pub async fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limited, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens available right now. Negative while reservations are outstanding.
    pub fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        bucket.refill(Instant::now());
        bucket.tokens
    }
}

/// Identifies the bucket a request draws from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

#[derive(Debug)]
struct Registry {
    config: RateLimitConfig,
    limiters: HashMap<RouteKey, Arc<RateLimiter>>,
}

/// Lazily created limiters, one per route, sharing one live configuration.
///
/// Entries are never removed; the set of routes an API client calls is small
/// and fixed.
#[derive(Debug)]
pub struct RateLimiterRegistry {
    inner: Mutex<Registry>,
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::with_config(RateLimitConfig::default())
    }
}

impl RateLimiterRegistry {
    /// Create a registry using the default rate (2/s) and burst (5).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a custom configuration.
    ///
    /// The configuration is not validated here; see
    /// [`RateLimitConfig::validate`]. An out-of-range rate never panics but
    /// makes each queued request wait up to an hour.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            inner: Mutex::new(Registry {
                config,
                limiters: HashMap::new(),
            }),
        }
    }

    /// The limiter for `(method, path)`, created on first use.
    pub fn acquire(&self, method: Method, path: &str) -> Arc<RateLimiter> {
        let mut inner = self.inner.lock();
        let key = RouteKey::new(method, path);
        if let Some(limiter) = inner.limiters.get(&key) {
            return Arc::clone(limiter);
        }
        let limiter = Arc::new(RateLimiter::new(inner.config));
        inner.limiters.insert(key, Arc::clone(&limiter));
        limiter
    }

    /// Change the rate for future limiters and every existing one.
    pub fn set_rate(&self, rate: f64) -> TransportResult<()> {
        validate_rate(rate)?;
        let mut inner = self.inner.lock();
        inner.config.rate = rate;
        for limiter in inner.limiters.values() {
            limiter.set_rate(rate);
        }
        Ok(())
    }

    /// Change the burst for future limiters and every existing one.
    pub fn set_burst(&self, burst: u32) -> TransportResult<()> {
        validate_burst(burst)?;
        let mut inner = self.inner.lock();
        inner.config.burst = burst;
        for limiter in inner.limiters.values() {
            limiter.set_burst(burst);
        }
        Ok(())
    }

    /// The configuration new limiters are created with.
    pub fn config(&self) -> RateLimitConfig {
        self.inner.lock().config
    }

    /// Number of routes seen so far.
    pub fn len(&self) -> usize {
        self.inner.lock().limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
