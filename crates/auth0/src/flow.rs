//! OAuth2 flows that produce an authenticated [`Auth0`].

use std::{error::Error, future::Future, sync::Arc};

use auth0_transport::{Authentication, BearerAuth};

use crate::{
    Auth0,
    config::Config,
    error::{Auth0Error, Result},
    token::{Grant, TokenSourceAuth},
};

/// `state` parameter sent with the authorization request.
const GRANT_STATE: &str = "state";

impl Config {
    /// Two-legged flow: Management and extension calls carry a client
    /// credentials token for `audience`, fetched on first use and renewed
    /// shortly before it expires.
    pub fn client_from_credentials(&self, audience: impl Into<String>) -> Result<Auth0> {
        let auth = TokenSourceAuth::new(
            self.token_service()?,
            &self.client_id,
            &self.client_secret,
            Grant::ClientCredentials {
                audience: audience.into(),
                scope: self.scope(),
            },
        );
        Auth0::new(self, Arc::new(auth))
    }

    /// Three-legged flow: `grant` receives the authorization URL and returns
    /// the code the user was redirected back with.
    ///
    /// If the token endpoint issues a refresh token, expired access tokens
    /// are renewed with it; otherwise the first access token is used as is.
    pub async fn client_from_grant<F, Fut, E>(&self, grant: F) -> Result<Auth0>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<String, E>>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let url = self.authorize_url(GRANT_STATE)?;
        let code = grant(url).await.map_err(|e| Auth0Error::Grant(e.into()))?;

        let tokens = self.token_service()?;
        let token = tokens
            .from_authorization_code(&self.client_id, &self.client_secret, &code, &self.redirect_uri)
            .await
            .map_err(Auth0Error::Exchange)?;

        let auth: Arc<dyn Authentication> = if token.refresh_token.is_empty() {
            Arc::new(BearerAuth::new(token.access_token))
        } else {
            let grant = Grant::RefreshToken(token.refresh_token.clone());
            Arc::new(
                TokenSourceAuth::new(tokens, &self.client_id, &self.client_secret, grant)
                    .with_token(&token),
            )
        };
        Auth0::new(self, auth)
    }
}
