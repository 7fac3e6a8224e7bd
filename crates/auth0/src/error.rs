//! Errors surfaced by the Auth0 services.

use auth0_transport::{ApiError, TransportError};
use thiserror::Error;

/// Result alias used by every service in this crate.
pub type Result<T> = std::result::Result<T, Auth0Error>;

/// Error type for configuration, token flows and resource calls.
#[derive(Error, Debug)]
pub enum Auth0Error {
    /// A request failed at the transport layer or the API rejected it.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A resource call failed; `context` names the operation.
    #[error("auth0: {context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: TransportError,
    },

    /// The configuration is incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The grant callback of the three-legged flow failed.
    #[error("failed to get authorization grant: {0}")]
    Grant(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The authorization code could not be exchanged for a token.
    #[error("failed to exchange authorization grant for token: {0}")]
    Exchange(#[source] TransportError),
}

impl Auth0Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a transport error with the name of the failed operation.
    pub(crate) fn context(context: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| Self::Context { context, source }
    }

    /// The API error behind this error, if the API answered non-2xx.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Transport(e) | Self::Context { source: e, .. } | Self::Exchange(e) => {
                e.api_error()
            }
            _ => None,
        }
    }

    /// HTTP status reported by the API, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|e| e.status_code)
    }
}
