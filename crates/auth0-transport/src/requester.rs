//! The request executor sitting between the typed client and the transport.
//!
//! A [`Requester`] performs exactly one request/response cycle and classifies
//! the outcome: 2xx responses yield their body (if any), everything else
//! becomes an [`ApiError`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    auth::{Authentication, NoAuth},
    error::{ApiError, TransportError, TransportResult},
    rate_limit::RateLimiterRegistry,
    transport::{Request, Response, Transport},
};

/// Executes a request and classifies the response.
#[async_trait]
pub trait Requester: Send + Sync + 'static {
    /// Send `request`. Returns `Ok(None)` for a 2xx response without body.
    async fn execute(&self, request: Request) -> TransportResult<Option<Bytes>>;
}

#[async_trait]
impl<R: Requester + ?Sized> Requester for Arc<R> {
    async fn execute(&self, request: Request) -> TransportResult<Option<Bytes>> {
        (**self).execute(request).await
    }
}

/// The default [`Requester`]: authentication, optional per-route rate
/// limiting, then the transport call.
#[derive(Debug)]
pub struct TransportDoer<T> {
    transport: T,
    auth: Arc<dyn Authentication>,
    limits: Option<Arc<RateLimiterRegistry>>,
}

impl<T: Transport> TransportDoer<T> {
    /// Create a doer without authentication or rate limiting.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            auth: Arc::new(NoAuth),
            limits: None,
        }
    }

    /// Authenticate every request with `auth`.
    pub fn with_auth(mut self, auth: Arc<dyn Authentication>) -> Self {
        self.auth = auth;
        self
    }

    /// Throttle requests through `registry`, keyed by method and URL path.
    pub fn with_rate_limits(mut self, registry: Arc<RateLimiterRegistry>) -> Self {
        self.limits = Some(registry);
        self
    }

    /// The registry in use, if any.
    pub fn rate_limits(&self) -> Option<&Arc<RateLimiterRegistry>> {
        self.limits.as_ref()
    }
}

#[async_trait]
impl<T: Transport> Requester for TransportDoer<T> {
    async fn execute(&self, mut request: Request) -> TransportResult<Option<Bytes>> {
        if request.method.sends_json() && request.has_body() {
            request
                .headers
                .insert("Content-Type".to_string(), "application/json".to_string());
        }

        self.auth.authenticate(&mut request).await?;

        if let Some(registry) = &self.limits {
            let path = request.path()?;
            registry.acquire(request.method, &path).acquire().await;
        }

        tracing::debug!(
            request_id = %request.id,
            method = %request.method,
            url = %request.url,
            "Sending request"
        );

        let response = self.transport.send(request).await?;

        tracing::trace!(
            request_id = %response.request_id,
            status = response.status.as_u16(),
            duration_ms = response.duration.as_millis() as u64,
            "Received response"
        );

        classify(response)
    }
}

/// Split a response into its body or an API error.
pub fn classify(response: Response) -> TransportResult<Option<Bytes>> {
    if response.is_success() {
        return Ok(response.has_body().then_some(response.body));
    }

    if !response.has_body() {
        return Err(ApiError::from_status_line(response.status, response.status_line()).into());
    }

    let api_error: ApiError = serde_json::from_slice(&response.body)
        .map_err(|e| TransportError::unmarshal(e, Some(&response.body)))?;
    Err(api_error.into())
}

/// Decode an optional JSON body.
pub fn decode<T: DeserializeOwned>(body: Option<Bytes>) -> TransportResult<Option<T>> {
    body.map(|bytes| {
        serde_json::from_slice(&bytes).map_err(|e| TransportError::unmarshal(e, Some(&bytes)))
    })
    .transpose()
}
