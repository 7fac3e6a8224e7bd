//! HTTP transport implementation backed by reqwest.

use std::{collections::HashMap, time::Duration, time::Instant};

use async_trait::async_trait;
use http::StatusCode;

use crate::{
    error::{TransportError, TransportResult},
    transport::{Request, Response, Transport},
};

/// Configuration for the HTTP transport and the API it talks to.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for all requests, e.g. `https://tenant.auth0.com/api/v2`
    pub base_url: String,

    /// Total timeout for a single request
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Headers added to every request
    pub default_headers: HashMap<String, String>,
}

impl HttpConfig {
    /// Create a new HTTP configuration with defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("auth0-transport/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }

    /// Create a builder for the HTTP configuration.
    pub fn builder(base_url: impl Into<String>) -> HttpConfigBuilder {
        HttpConfigBuilder::new(base_url)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TransportResult<()> {
        if self.base_url.is_empty() {
            return Err(TransportError::config("Base URL cannot be empty"));
        }

        if self.timeout.is_zero() {
            return Err(TransportError::config("Timeout cannot be zero"));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| TransportError::config(format!("Invalid base URL: {e}")))?;

        Ok(())
    }
}

/// Builder for HTTP configuration.
#[derive(Debug)]
pub struct HttpConfigBuilder {
    config: HttpConfig,
}

impl HttpConfigBuilder {
    /// Create a new builder.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: HttpConfig::new(base_url),
        }
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a default header.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .insert(name.into(), value.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TransportResult<HttpConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// A [`Transport`] that performs real HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    default_headers: HashMap<String, String>,
}

impl HttpTransport {
    /// Create a transport from the given configuration.
    pub fn new(config: &HttpConfig) -> TransportResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TransportError::config(format!("Failed to build client: {e}")))?;

        Ok(Self::from_client(client).with_default_headers(config.default_headers.clone()))
    }

    /// Wrap an existing reqwest client, e.g. one with custom TLS or proxy settings.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            default_headers: HashMap::new(),
        }
    }

    fn with_default_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> TransportResult<Response> {
        let started = Instant::now();
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());

        for (name, value) in &self.default_headers {
            if !request.headers.contains_key(name) {
                builder = builder.header(name, value);
            }
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let http_request = builder
            .build()
            .map_err(|e| TransportError::request(e.to_string()))?;

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| TransportError::http("cannot complete request", e))?;

        let status: StatusCode = response.status();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::http("cannot read response body", e))?;

        Ok(Response {
            request_id: request.id,
            status,
            headers,
            body,
            duration: started.elapsed(),
        })
    }
}
