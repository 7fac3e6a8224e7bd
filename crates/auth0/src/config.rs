//! Tenant and OAuth2 client configuration.

use std::time::Duration;

use auth0_transport::{
    Client, RateLimitConfig, RetryPolicy, TransportDoer,
    http::{HttpConfig, HttpTransport},
};
use url::Url;

use crate::{
    error::{Auth0Error, Result},
    token::TokenService,
};

/// Configuration for an Auth0 tenant and the application talking to it.
///
/// # Environment
///
/// [`Config::from_env`] reads:
/// - `AUTH0_TENANT` or `AUTH0_DOMAIN` (one is required)
/// - `AUTH0_CLIENT_ID`, `AUTH0_CLIENT_SECRET` (required)
/// - `AUTH0_REDIRECT_URI`, `AUTH0_AUTHORIZATION_URL` (optional)
/// - `AUTH0_SCOPES`, space separated (optional)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Tenant name; the site is `https://<tenant>.auth0.com`.
    pub tenant: String,

    /// Explicit site, e.g. a custom domain. Takes precedence over `tenant`.
    pub domain: Option<String>,

    pub client_id: String,

    pub client_secret: String,

    /// Callback URL for the authorization-code flow.
    pub redirect_uri: String,

    /// Root URL of the Authorization Extension API, if installed.
    pub authorization_url: Option<String>,

    pub scopes: Vec<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// 429 retry policy for Management and Authorization Extension calls.
    pub retry: RetryPolicy,

    /// Per-route rate limits for Management and Authorization Extension calls.
    pub rate_limits: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            domain: None,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            authorization_url: None,
            scopes: Vec::new(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            rate_limits: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Configuration for `tenant` with the given client credentials.
    pub fn new(
        tenant: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Load the configuration from runtime environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| Auth0Error::config(format!("{key} is not set")));

        let tenant = var("AUTH0_TENANT").unwrap_or_default();
        let domain = var("AUTH0_DOMAIN");
        if tenant.is_empty() && domain.is_none() {
            return Err(Auth0Error::config(
                "one of AUTH0_TENANT or AUTH0_DOMAIN must be set",
            ));
        }

        Ok(Self {
            tenant,
            domain,
            client_id: required("AUTH0_CLIENT_ID")?,
            client_secret: required("AUTH0_CLIENT_SECRET")?,
            redirect_uri: var("AUTH0_REDIRECT_URI").unwrap_or_default(),
            authorization_url: var("AUTH0_AUTHORIZATION_URL"),
            scopes: var("AUTH0_SCOPES")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            ..Self::default()
        })
    }

    /// Use `domain` as the site instead of the tenant's default host.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Enable the Authorization Extension service rooted at `url`.
    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// The tenant's base URL, without trailing slash.
    pub fn site(&self) -> String {
        match &self.domain {
            Some(domain) if domain.contains("://") => domain.trim_end_matches('/').to_string(),
            Some(domain) => format!("https://{}", domain.trim_end_matches('/')),
            None => format!("https://{}.auth0.com", self.tenant),
        }
    }

    /// Scopes as Auth0 expects them: one space separated string.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// The URL a user visits to grant this application access.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&format!("{}/authorize", self.site()))
            .map_err(|e| Auth0Error::config(format!("invalid site: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope())
            .append_pair("state", state)
            .append_pair("access_type", "offline");
        Ok(url.into())
    }

    /// Check the fields every flow needs.
    pub fn validate(&self) -> Result<()> {
        if self.tenant.is_empty() && self.domain.is_none() {
            return Err(Auth0Error::config("tenant or domain is required"));
        }
        if self.client_id.is_empty() {
            return Err(Auth0Error::config("client id is required"));
        }
        self.rate_limits.validate()?;
        Ok(())
    }

    pub(crate) fn http_transport(&self) -> Result<HttpTransport> {
        let config = HttpConfig::builder(self.site())
            .timeout(self.timeout)
            .build()?;
        Ok(HttpTransport::new(&config)?)
    }

    /// A token service for this tenant, without retry or rate limiting.
    pub fn token_service(&self) -> Result<TokenService> {
        let doer = TransportDoer::new(self.http_transport()?);
        Ok(TokenService::new(Client::new(
            self.site(),
            std::sync::Arc::new(doer),
        )))
    }
}
