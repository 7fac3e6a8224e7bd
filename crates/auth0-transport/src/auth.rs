//! Authentication providers applied to every outbound request.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{error::TransportResult, transport::Request};

/// Adds credentials to a request before it is sent.
#[async_trait]
pub trait Authentication: Send + Sync + fmt::Debug {
    /// Authenticate a request by modifying it in place.
    async fn authenticate(&self, request: &mut Request) -> TransportResult<()>;
}

#[async_trait]
impl<A: Authentication + ?Sized> Authentication for Arc<A> {
    async fn authenticate(&self, request: &mut Request) -> TransportResult<()> {
        (**self).authenticate(request).await
    }
}

/// No authentication
#[derive(Debug, Clone, Default)]
pub struct NoAuth;

#[async_trait]
impl Authentication for NoAuth {
    async fn authenticate(&self, _request: &mut Request) -> TransportResult<()> {
        Ok(())
    }
}

/// Bearer token authentication
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    /// Create a new bearer token authentication.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authentication for BearerAuth {
    async fn authenticate(&self, request: &mut Request) -> TransportResult<()> {
        request
            .headers
            .insert("Authorization".to_string(), format!("Bearer {}", self.token));
        Ok(())
    }
}
