use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A refresh token issued to one of a user's devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub device_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,
}

/// `/device-credentials` endpoints.
#[derive(Debug, Clone)]
pub struct DeviceCredentialsService {
    client: Client,
}

impl DeviceCredentialsService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// All refresh tokens held by `user_id`.
    pub async fn get(&self, user_id: &str) -> Result<Vec<TokenData>> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("user_id", user_id)
            .append_pair("type", "refresh_token")
            .finish();
        Ok(self
            .client
            .get_paged(&format!("/device-credentials?{query}"))
            .await?)
    }

    /// Delete one credential by its Auth0 id (not the device name).
    pub async fn delete(&self, token_id: &str) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/device-credentials/{token_id}"))
            .await?;
        Ok(())
    }

    /// Delete every refresh token of `user_id` issued to `device`.
    ///
    /// Stops at the first failed delete; earlier deletes are not undone.
    pub async fn delete_by_identifier(&self, user_id: &str, device: &str) -> Result<()> {
        let tokens = self.get(user_id).await?;
        for token in tokens.iter().filter(|t| t.device_name == device) {
            tracing::debug!(user_id, device, token_id = %token.id, "Revoking device credential");
            self.delete(&token.id).await?;
        }
        Ok(())
    }
}
