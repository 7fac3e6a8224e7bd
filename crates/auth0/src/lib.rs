//! # Auth0
//!
//! Typed clients for the Auth0 Authentication, Management and Authorization
//! Extension APIs, built on [`auth0_transport`].
//!
//! An [`Auth0`] bundles a token service for the tenant, the Management API
//! services under `/api/v2` and, when an extension URL is configured, the
//! Authorization Extension services. Management and extension calls share one
//! authenticated, rate-limited requester that retries on HTTP 429.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use auth0::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let auth0 = config.client_from_credentials("https://tenant.auth0.com/api/v2/")?;
//!
//!     for user in auth0.mgmt().users().get_all().await? {
//!         println!("{} <{}>", user.id, user.email);
//!     }
//!     Ok(())
//! }
//! ```

pub mod authz;
pub mod config;
pub mod error;
mod flow;
pub mod mgmt;
pub mod token;

use std::sync::Arc;

use auth0_transport::{
    Authentication, Client, RateLimiterRegistry, Requester, RetryTransport, TransportDoer,
    TransportError,
};

pub use authz::AuthorizationService;
pub use config::Config;
pub use error::{Auth0Error, Result};
pub use mgmt::ManagementService;
pub use token::{Grant, TokenRequest, TokenResponse, TokenService, TokenSourceAuth};

/// Path of the Management API below the tenant site.
const MANAGEMENT_PATH: &str = "/api/v2";

/// A client for one Auth0 tenant.
#[derive(Debug, Clone)]
pub struct Auth0 {
    site: String,
    token: TokenService,
    mgmt: ManagementService,
    authz: Option<AuthorizationService>,
    limits: Arc<RateLimiterRegistry>,
}

impl Auth0 {
    /// Build a client whose Management and extension requests are signed by `auth`.
    pub fn new(config: &Config, auth: Arc<dyn Authentication>) -> Result<Self> {
        config.validate()?;

        let site = config.site();
        let limits = Arc::new(RateLimiterRegistry::with_config(config.rate_limits));
        let transport = RetryTransport::new(config.http_transport()?, config.retry.clone());
        let requester: Arc<dyn Requester> = Arc::new(
            TransportDoer::new(transport)
                .with_auth(auth)
                .with_rate_limits(Arc::clone(&limits)),
        );

        let mgmt = ManagementService::new(Client::new(
            format!("{site}{MANAGEMENT_PATH}"),
            Arc::clone(&requester),
        ));
        let authz = config
            .authorization_url
            .as_ref()
            .map(|url| AuthorizationService::new(Client::new(url.as_str(), Arc::clone(&requester))));

        tracing::debug!(%site, authz = authz.is_some(), "Created Auth0 client");
        Ok(Self {
            token: config.token_service()?,
            site,
            mgmt,
            authz,
            limits,
        })
    }

    /// The tenant's base URL.
    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn token(&self) -> &TokenService {
        &self.token
    }

    pub fn mgmt(&self) -> &ManagementService {
        &self.mgmt
    }

    /// The Authorization Extension, if an extension URL was configured.
    pub fn authz(&self) -> Option<&AuthorizationService> {
        self.authz.as_ref()
    }

    /// Per-route limiters shared by Management and extension calls.
    ///
    /// Changing the rate or burst here applies to every route immediately.
    pub fn rate_limits(&self) -> &Arc<RateLimiterRegistry> {
        &self.limits
    }
}

/// Turn an absent response body into an error for calls that must return one.
pub(crate) fn require_body<T>(body: Option<T>, endpoint: &str) -> Result<T> {
    body.ok_or_else(|| TransportError::empty_response(endpoint).into())
}
