use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Result, require_body};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Permission {
    #[serde(rename = "_id", skip_serializing)]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub application_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub application_id: String,
}

#[derive(Deserialize)]
struct PermissionList {
    #[serde(default)]
    permissions: Vec<Permission>,
}

/// `/api/permissions` endpoints.
#[derive(Debug, Clone)]
pub struct PermissionsService {
    client: Client,
}

impl PermissionsService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<Vec<Permission>> {
        let list: Option<PermissionList> = self.client.get("/api/permissions").await?;
        Ok(list.map(|l| l.permissions).unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Permission> {
        let endpoint = format!("/api/permissions/{id}");
        require_body(self.client.get(&endpoint).await?, &endpoint)
    }

    pub async fn create(&self, permission: &Permission) -> Result<Permission> {
        require_body(
            self.client.post("/api/permissions", permission).await?,
            "/api/permissions",
        )
    }

    pub async fn update(&self, permission: &Permission) -> Result<Permission> {
        let endpoint = format!("/api/permissions/{}", permission.id);
        require_body(self.client.put(&endpoint, permission).await?, &endpoint)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/api/permissions/{id}"))
            .await?;
        Ok(())
    }
}
