//! The `/oauth/token` endpoint and a cached bearer token provider.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use auth0_transport::{Authentication, Client, Request, TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};

const TOKEN_ENDPOINT: &str = "/oauth/token";
const REALM_GRANT: &str = "http://auth0.com/oauth/grant-type/password-realm";

/// Tokens are refreshed this long before they expire, or halfway through
/// their lifetime when that comes later.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Body of a POST to `/oauth/token`. Empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audience: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code_verifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub realm: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
}

/// A token issued by `/oauth/token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds; 0 when the server did not say.
    #[serde(default)]
    pub expires_in: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

/// Client for the Authentication API token endpoint.
#[derive(Debug, Clone)]
pub struct TokenService {
    client: Client,
}

impl TokenService {
    /// Create a token service; `client` must point at the tenant site.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// POST `request` to `/oauth/token`.
    pub async fn get_token(&self, request: &TokenRequest) -> TransportResult<TokenResponse> {
        self.client
            .post(TOKEN_ENDPOINT, request)
            .await?
            .ok_or_else(|| TransportError::empty_response(TOKEN_ENDPOINT))
    }

    /// Machine-to-machine token for `audience`.
    pub async fn from_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
        audience: &str,
    ) -> TransportResult<TokenResponse> {
        self.get_token(&TokenRequest {
            grant_type: "client_credentials".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            audience: audience.to_string(),
            ..TokenRequest::default()
        })
        .await
    }

    /// Resource owner password grant.
    pub async fn from_user_pass(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
    ) -> TransportResult<TokenResponse> {
        self.get_token(&TokenRequest {
            grant_type: "password".to_string(),
            client_id: client_id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..TokenRequest::default()
        })
        .await
    }

    /// Password grant against a specific connection (realm).
    pub async fn from_realm_user_pass(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
        realm: &str,
    ) -> TransportResult<TokenResponse> {
        self.get_token(&TokenRequest {
            grant_type: REALM_GRANT.to_string(),
            client_id: client_id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            realm: realm.to_string(),
            ..TokenRequest::default()
        })
        .await
    }

    /// Exchange an authorization code.
    pub async fn from_authorization_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> TransportResult<TokenResponse> {
        self.get_token(&TokenRequest {
            grant_type: "authorization_code".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
            ..TokenRequest::default()
        })
        .await
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> TransportResult<TokenResponse> {
        self.get_token(&TokenRequest {
            grant_type: "refresh_token".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            ..TokenRequest::default()
        })
        .await
    }
}

/// How [`TokenSourceAuth`] obtains a new token.
#[derive(Clone, PartialEq, Eq)]
pub enum Grant {
    /// Client credentials for the given API audience.
    ClientCredentials { audience: String, scope: String },
    /// A refresh token from an earlier authorization-code exchange.
    RefreshToken(String),
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials { audience, scope } => f
                .debug_struct("ClientCredentials")
                .field("audience", audience)
                .field("scope", scope)
                .finish(),
            Self::RefreshToken(_) => f.write_str("RefreshToken(<redacted>)"),
        }
    }
}

struct CachedToken {
    access_token: String,
    refresh_at: Option<Instant>,
}

impl CachedToken {
    fn from_response(response: &TokenResponse) -> Self {
        let refresh_at = (response.expires_in > 0).then(|| {
            let lifetime = Duration::from_secs(u64::from(response.expires_in));
            Instant::now() + lifetime - EXPIRY_MARGIN.min(lifetime / 2)
        });
        Self {
            access_token: response.access_token.clone(),
            refresh_at,
        }
    }

    fn is_fresh(&self) -> bool {
        self.refresh_at.is_none_or(|at| Instant::now() < at)
    }
}

/// Bearer authentication backed by `/oauth/token`, fetched lazily and cached
/// until shortly before it expires.
pub struct TokenSourceAuth {
    tokens: TokenService,
    client_id: String,
    client_secret: String,
    grant: Grant,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for TokenSourceAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSourceAuth")
            .field("client_id", &self.client_id)
            .field("grant", &self.grant)
            .finish_non_exhaustive()
    }
}

impl TokenSourceAuth {
    pub fn new(
        tokens: TokenService,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        grant: Grant,
    ) -> Self {
        Self {
            tokens,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant,
            cached: Mutex::new(None),
        }
    }

    /// Start from a token that was already issued.
    pub fn with_token(self, token: &TokenResponse) -> Self {
        Self {
            cached: Mutex::new(Some(CachedToken::from_response(token))),
            ..self
        }
    }

    /// The current access token, fetching a new one if needed.
    pub async fn access_token(&self) -> TransportResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        tracing::debug!(grant = ?self.grant, "Fetching access token");
        let response = self
            .fetch()
            .await
            .map_err(|e| TransportError::auth(format!("cannot obtain access token: {e}")))?;
        let token = CachedToken::from_response(&response);
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch(&self) -> TransportResult<TokenResponse> {
        match &self.grant {
            Grant::ClientCredentials { audience, scope } => {
                self.tokens
                    .get_token(&TokenRequest {
                        grant_type: "client_credentials".to_string(),
                        client_id: self.client_id.clone(),
                        client_secret: self.client_secret.clone(),
                        audience: audience.clone(),
                        scope: scope.clone(),
                        ..TokenRequest::default()
                    })
                    .await
            }
            Grant::RefreshToken(refresh_token) => {
                self.tokens
                    .refresh(&self.client_id, &self.client_secret, refresh_token)
                    .await
            }
        }
    }
}

#[async_trait]
impl Authentication for TokenSourceAuth {
    async fn authenticate(&self, request: &mut Request) -> TransportResult<()> {
        let token = self.access_token().await?;
        request
            .headers
            .insert("Authorization".to_string(), format!("Bearer {token}"));
        Ok(())
    }
}
