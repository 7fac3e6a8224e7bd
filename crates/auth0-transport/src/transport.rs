//! Core transport abstractions and types.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{TransportError, TransportResult};

/// Unique identifier for requests, used to correlate log events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The HTTP verbs the Auth0 APIs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Whether a body sent with this verb is JSON for the Auth0 APIs.
    pub fn sends_json(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    /// The canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
        }
    }
}

/// A single outbound request. Created per call and consumed by the transport.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique identifier for this request
    pub id: RequestId,

    /// HTTP method
    pub method: Method,

    /// Absolute request URL, query string included
    pub url: String,

    /// Request headers
    pub headers: HashMap<String, String>,

    /// Request body
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a new request.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Encode `data` as JSON and use it as the request body.
    pub fn json<T: Serialize + ?Sized>(mut self, data: &T) -> TransportResult<Self> {
        let encoded = serde_json::to_vec(data).map_err(TransportError::marshal)?;
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }

    /// Whether the request carries a non-empty body.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// The URL path without query string, used as the rate limiting route.
    pub fn path(&self) -> TransportResult<String> {
        let url = url::Url::parse(&self.url)
            .map_err(|e| TransportError::request(format!("invalid URL {}: {e}", self.url)))?;
        Ok(url.path().to_string())
    }
}

/// A raw response as returned by a [`Transport`].
#[derive(Debug, Clone)]
pub struct Response {
    /// Request ID this response corresponds to
    pub request_id: RequestId,

    /// Response status code
    pub status: StatusCode,

    /// Response headers, names lower-cased
    pub headers: HashMap<String, String>,

    /// Response body
    pub body: Bytes,

    /// Round-trip time
    pub duration: Duration,
}

impl Response {
    /// Create a new response.
    pub fn new(request_id: RequestId, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            request_id,
            status,
            headers: HashMap::new(),
            body: body.into(),
            duration: Duration::ZERO,
        }
    }

    /// Check if the status is in the 200-299 range.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status.as_u16())
    }

    /// Whether the response carried any body bytes.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// The status line text, e.g. `404 Not Found`.
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_str(), reason),
            None => self.status.as_str().to_string(),
        }
    }

    /// Get a header value by lower-case name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Executes a single request against the network (or something standing in for it).
///
/// Implementations must not interpret status codes; classification belongs to the
/// [`Requester`](crate::requester::Requester).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a request and return the raw response.
    async fn send(&self, request: Request) -> TransportResult<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> TransportResult<Response> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_request_creation() {
        let request = Request::get("https://tenant.auth0.com/api/v2/users?q=email")
            .header("Accept", "application/json");

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.headers.get("Accept").map(String::as_str), Some("application/json"));
        assert!(!request.has_body());
        assert_eq!(request.path().unwrap(), "/api/v2/users");
    }

    #[test]
    fn test_request_json() {
        #[derive(Serialize)]
        struct Body {
            email: &'static str,
        }

        let request = Request::post("https://tenant.auth0.com/api/v2/users")
            .json(&Body { email: "a@b.com" })
            .unwrap();

        assert!(request.has_body());
        assert_eq!(request.body.as_deref(), Some(&br#"{"email":"a@b.com"}"#[..]));
    }

    #[test]
    fn test_request_json_marshal_failure() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1);

        let err = Request::post("https://tenant.auth0.com/x").json(&bad).unwrap_err();
        assert!(matches!(err, TransportError::Serialization(_)));
    }

    #[test]
    fn test_invalid_url_path() {
        let request = Request::get("not a url");
        assert!(matches!(
            request.path().unwrap_err(),
            TransportError::Request { .. }
        ));
    }

    #[test]
    fn test_response_status_checks() {
        let response = Response::new(RequestId::new(), StatusCode::OK, "{}");
        assert!(response.is_success());
        assert!(response.has_body());

        let response = Response::new(RequestId::new(), StatusCode::NO_CONTENT, "");
        assert!(response.is_success());
        assert!(!response.has_body());

        let response = Response::new(RequestId::new(), StatusCode::NOT_FOUND, "");
        assert!(!response.is_success());
        assert_eq!(response.status_line(), "404 Not Found");

        let response = Response::new(RequestId::new(), StatusCode::MULTIPLE_CHOICES, "");
        assert!(!response.is_success());
    }

    #[test]
    fn test_method_json_verbs() {
        assert!(Method::Post.sends_json());
        assert!(Method::Put.sends_json());
        assert!(Method::Patch.sends_json());
        assert!(!Method::Get.sends_json());
        assert!(!Method::Delete.sends_json());
        assert_eq!(http::Method::from(Method::Patch), http::Method::PATCH);
    }
}
