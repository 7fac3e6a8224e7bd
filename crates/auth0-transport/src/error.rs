//! Error handling for the transport layer.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main result type used throughout the transport layer.
pub type TransportResult<T> = Result<T, TransportError>;

/// An error body returned by an Auth0 API for a non-2xx response.
///
/// Field names follow the wire format: `{"statusCode": 404, "error": "Not Found", "message": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code reported by the API.
    #[serde(rename = "statusCode", default, skip_serializing_if = "is_zero")]
    pub status_code: u16,

    /// Short HTTP error text, e.g. `Not Found`.
    #[serde(rename = "error", default, skip_serializing_if = "String::is_empty")]
    pub http_error: String,

    /// Human readable explanation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

fn is_zero(code: &u16) -> bool {
    *code == 0
}

impl ApiError {
    /// Synthesize an error for a response that carried no body.
    pub fn from_status_line(status: StatusCode, status_line: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            http_error: status_line.into(),
            message: String::new(),
        }
    }

    /// The status code as an `http::StatusCode`, if it is a valid one.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if self.status_code != 0 {
            parts.push(self.status_code.to_string());
        }
        if !self.http_error.is_empty() {
            parts.push(self.http_error.clone());
        }
        if !self.message.is_empty() {
            parts.push(format!("({})", self.message));
        }
        write!(f, "auth0: {}", parts.join(" "))
    }
}

impl std::error::Error for ApiError {}

/// Error type for all transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be constructed.
    #[error("cannot create request: {message}")]
    Request { message: String },

    /// The request body could not be encoded as JSON.
    #[error("cannot marshal body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A response body could not be decoded.
    #[error("cannot unmarshal response: {source}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        /// Raw body, kept for debugging.
        body: Option<String>,
    },

    /// A response had a shape the caller could not work with.
    #[error("unexpected response from GET {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    /// The API answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 2xx response had no body where one was required.
    #[error("empty response body from {endpoint}")]
    EmptyResponse { endpoint: String },

    /// Authentication errors.
    #[error("authentication error: {message}")]
    Auth { message: String },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Internal errors (should not happen in normal operation).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TransportError {
    /// Wrap a transport failure with a short context message.
    pub fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    /// Create a request construction error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Create a marshal error.
    pub fn marshal(source: serde_json::Error) -> Self {
        Self::Serialization(source)
    }

    /// Create an unmarshal error, keeping the offending body when there is one.
    pub fn unmarshal(source: serde_json::Error, body: Option<&[u8]>) -> Self {
        Self::Deserialization {
            source,
            body: body.map(|b| String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Create an unexpected response error.
    pub fn unexpected(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an empty response error.
    pub fn empty_response(endpoint: impl Into<String>) -> Self {
        Self::EmptyResponse {
            endpoint: endpoint.into(),
        }
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The API error carried by this error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// The HTTP status code reported by the API, if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|e| e.status_code)
    }
}
