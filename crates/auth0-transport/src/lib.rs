//! # Auth0 Transport
//!
//! The request layer shared by every Auth0 API client.
//!
//! A [`Client`] joins endpoints onto an API base URL, encodes bodies as JSON and
//! hands the request to a [`Requester`]. The default requester,
//! [`TransportDoer`], authenticates the request, waits on a per-route token
//! bucket from a [`RateLimiterRegistry`], sends it over a [`Transport`] and maps
//! non-2xx responses to an [`ApiError`].
//!
//! ## Features
//!
//! - **Typed verbs**: `get`/`post`/`put`/`patch`/`delete`, each with a header-carrying variant
//! - **Pagination**: concurrent page fan-out with in-order merge for `/api/v2` listings
//! - **Rate limiting**: live-reconfigurable token buckets keyed by method and path
//! - **429 retry**: exponential backoff honoring `Retry-After`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use auth0_transport::{Client, http::HttpConfig};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     user_id: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpConfig::builder("https://tenant.auth0.com/api/v2")
//!         .timeout(std::time::Duration::from_secs(5))
//!         .build()?;
//!     let client = Client::from_config(&config)?;
//!
//!     let user: Option<User> = client.get("/users/abc123").await?;
//!     let everyone: Vec<User> = client.get_paged("/users").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod paging;
pub mod rate_limit;
pub mod requester;
pub mod retry;
pub mod transport;

// Re-export commonly used types
pub use auth::{Authentication, BearerAuth, NoAuth};
pub use client::Client;
pub use error::{ApiError, TransportError, TransportResult};
pub use paging::PagingConfig;
pub use rate_limit::{RateLimitConfig, RateLimiter, RateLimiterRegistry};
pub use requester::{Requester, TransportDoer};
pub use retry::{RetryPolicy, RetryTransport};
pub use transport::{Method, Request, Response, Transport};
