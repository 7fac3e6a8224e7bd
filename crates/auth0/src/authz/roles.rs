use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Result, require_body};

/// A role: a named set of permissions for one application.
///
/// `id` is never serialized, so a role read from the API can be sent back
/// as a create or update body as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Role {
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
    /// Permission ids.
    #[serde(rename = "permissions", skip_serializing_if = "Vec::is_empty")]
    pub permission_ids: Vec<String>,
}

#[derive(Deserialize)]
struct RoleList {
    #[serde(default)]
    roles: Vec<Role>,
}

/// `/api/roles` endpoints.
#[derive(Debug, Clone)]
pub struct RolesService {
    client: Client,
}

impl RolesService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<Vec<Role>> {
        let list: Option<RoleList> = self.client.get("/api/roles").await?;
        Ok(list.map(|l| l.roles).unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Role> {
        let endpoint = format!("/api/roles/{id}");
        require_body(self.client.get(&endpoint).await?, &endpoint)
    }

    pub async fn create(&self, role: &Role) -> Result<Role> {
        require_body(self.client.post("/api/roles", role).await?, "/api/roles")
    }

    /// Replace the role identified by `role.id`.
    pub async fn update(&self, role: &Role) -> Result<Role> {
        let endpoint = format!("/api/roles/{}", role.id);
        require_body(self.client.put(&endpoint, role).await?, &endpoint)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/api/roles/{id}"))
            .await?;
        Ok(())
    }
}
