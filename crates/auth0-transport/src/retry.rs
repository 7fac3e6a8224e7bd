//! Retry on HTTP 429.
//!
//! The Auth0 APIs answer `429 Too Many Requests` when a tenant exceeds its
//! rate limit. [`RetryTransport`] re-sends such requests with exponential
//! backoff. Every other status, and every transport failure, is passed
//! through untouched.

use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use tokio::time::sleep;

use crate::{
    error::TransportResult,
    transport::{Request, Response, Transport},
};

/// Configuration for 429 retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the initial request included.
    pub max_attempts: usize,
    /// Delay before the first retry.
    pub min_wait: Duration,
    /// Upper bound for any single delay, `Retry-After` included.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and wait bounds.
    pub fn new(max_attempts: usize, min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_attempts,
            min_wait,
            max_wait,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (1-indexed): `min_wait * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as u32;
        self.min_wait
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_wait)
    }

    fn delay_for(&self, attempt: usize, response: &Response) -> Duration {
        match retry_after(response) {
            Some(wait) => wait.min(self.max_wait),
            None => self.backoff(attempt),
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .header("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Wraps a transport and retries requests rejected with 429.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryTransport<T> {
    /// Wrap `transport` with the given policy.
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            inner: transport,
            policy,
        }
    }

    /// The policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn send(&self, request: Request) -> TransportResult<Response> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = self.inner.send(request.clone()).await?;

            if response.status != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    request_id = %request.id,
                    attempts = attempt,
                    "Rate limited, retries exhausted"
                );
                return Ok(response);
            }

            let delay = self.policy.delay_for(attempt, &response);
            tracing::info!(
                request_id = %request.id,
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying rate limited request"
            );
            sleep(delay).await;
        }
    }
}
