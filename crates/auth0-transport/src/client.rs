//! Typed REST client with verb-shaped helpers.

use std::{collections::HashMap, fmt, sync::Arc};

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{TransportError, TransportResult},
    http::{HttpConfig, HttpTransport},
    paging::PagingConfig,
    rate_limit::RateLimiterRegistry,
    requester::{Requester, TransportDoer, decode},
    transport::{Method, Request},
};

/// A client bound to one API base URL.
///
/// Endpoints passed to the verb methods are paths relative to that base,
/// e.g. `/users/abc123`. Each verb returns `Ok(None)` when the API answers
/// 2xx without a body.
#[derive(Clone)]
pub struct Client {
    api: String,
    requester: Arc<dyn Requester>,
    pub(crate) paging: PagingConfig,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api", &self.api)
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for `api` that sends through `requester`.
    pub fn new(api: impl Into<String>, requester: Arc<dyn Requester>) -> Self {
        Self {
            api: api.into(),
            requester,
            paging: PagingConfig::default(),
        }
    }

    /// Create a client over HTTP with default rate limiting and no authentication.
    pub fn from_config(config: &HttpConfig) -> TransportResult<Self> {
        let transport = HttpTransport::new(config)?;
        let doer = TransportDoer::new(transport)
            .with_rate_limits(Arc::new(RateLimiterRegistry::new()));
        Ok(Self::new(config.base_url.clone(), Arc::new(doer)))
    }

    /// Override the pagination settings.
    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    /// The API base URL as configured.
    pub fn api(&self) -> &str {
        &self.api
    }

    /// The requester this client sends through.
    pub fn requester(&self) -> &Arc<dyn Requester> {
        &self.requester
    }

    /// Join `endpoint` onto the API base without doubling the slash.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api.trim_end_matches('/'), endpoint)
    }

    /// Execute a prepared request and decode its body.
    pub async fn execute<R: DeserializeOwned>(&self, request: Request) -> TransportResult<Option<R>> {
        decode(self.requester.execute(request).await?)
    }

    /// GET `endpoint`.
    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> TransportResult<Option<R>> {
        self.send(Method::Get, endpoint, None, &HashMap::new()).await
    }

    /// GET `endpoint` with extra headers.
    pub async fn get_with_headers<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<R>> {
        self.send(Method::Get, endpoint, None, headers).await
    }

    /// POST `body` as JSON to `endpoint`.
    pub async fn post<B, R>(&self, endpoint: &str, body: &B) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post_with_headers(endpoint, body, &HashMap::new()).await
    }

    /// POST with extra headers.
    pub async fn post_with_headers<B, R>(
        &self,
        endpoint: &str,
        body: &B,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        self.send(Method::Post, endpoint, Some(body), headers).await
    }

    /// PUT `body` as JSON to `endpoint`.
    pub async fn put<B, R>(&self, endpoint: &str, body: &B) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.put_with_headers(endpoint, body, &HashMap::new()).await
    }

    /// PUT with extra headers.
    pub async fn put_with_headers<B, R>(
        &self,
        endpoint: &str,
        body: &B,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        self.send(Method::Put, endpoint, Some(body), headers).await
    }

    /// PATCH `body` as JSON to `endpoint`.
    pub async fn patch<B, R>(&self, endpoint: &str, body: &B) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.patch_with_headers(endpoint, body, &HashMap::new()).await
    }

    /// PATCH with extra headers.
    pub async fn patch_with_headers<B, R>(
        &self,
        endpoint: &str,
        body: &B,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        self.send(Method::Patch, endpoint, Some(body), headers).await
    }

    /// DELETE `endpoint` without a body.
    pub async fn delete<R: DeserializeOwned>(&self, endpoint: &str) -> TransportResult<Option<R>> {
        self.send(Method::Delete, endpoint, None, &HashMap::new()).await
    }

    /// DELETE `endpoint` with a JSON body.
    pub async fn delete_with_body<B, R>(&self, endpoint: &str, body: &B) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.delete_with_headers(endpoint, Some(body), &HashMap::new())
            .await
    }

    /// DELETE with an optional JSON body and extra headers.
    pub async fn delete_with_headers<B, R>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = body.map(encode).transpose()?;
        self.send(Method::Delete, endpoint, body, headers).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Bytes>,
        headers: &HashMap<String, String>,
    ) -> TransportResult<Option<R>> {
        let mut request = with_headers(Request::new(method, self.url(endpoint)), headers);
        request.body = body;
        self.execute(request).await
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> TransportResult<Bytes> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(TransportError::marshal)
}

/// Copy `headers` onto `request`, skipping blank names and values.
pub(crate) fn with_headers(mut request: Request, headers: &HashMap<String, String>) -> Request {
    for (name, value) in headers {
        let (name, value) = (name.trim(), value.trim());
        if !name.is_empty() && !value.is_empty() {
            request.headers.insert(name.to_string(), value.to_string());
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rate_limit::RateLimitConfig, transport::Transport};

    struct Never;

    #[async_trait::async_trait]
    impl Transport for Never {
        async fn send(&self, _request: Request) -> TransportResult<crate::transport::Response> {
            Err(TransportError::internal("unreachable"))
        }
    }

    fn client(api: &str) -> Client {
        let doer = TransportDoer::new(Never).with_rate_limits(Arc::new(
            RateLimiterRegistry::with_config(RateLimitConfig::unlimited()),
        ));
        Client::new(api, Arc::new(doer))
    }

    #[test]
    fn test_url_join() {
        assert_eq!(
            client("https://t.auth0.com/api/v2/").url("/users"),
            "https://t.auth0.com/api/v2/users"
        );
        assert_eq!(
            client("https://t.auth0.com/api/v2").url("/users"),
            "https://t.auth0.com/api/v2/users"
        );
    }

    #[test]
    fn test_blank_headers_skipped() {
        let mut headers = HashMap::new();
        headers.insert("X-Keep".to_string(), "yes".to_string());
        headers.insert("  ".to_string(), "value".to_string());
        headers.insert("X-Blank".to_string(), " ".to_string());

        let request = with_headers(Request::get("http://x"), &headers);
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers.get("X-Keep").map(String::as_str), Some("yes"));
    }
}
