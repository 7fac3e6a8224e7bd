use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Role;
use crate::{error::Result, require_body};

/// A group. `id` is assigned by the extension and never sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(rename = "_id", skip_serializing)]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// User ids, only populated by an expanded `get`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<Value>,
}

/// Maps every user of a connection into a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mapping {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connection_name: String,
}

/// Direct members of a group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupMembers {
    pub total: u64,
    pub users: Vec<Map<String, Value>>,
}

#[derive(Serialize)]
struct GroupBody<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
struct GroupList {
    #[serde(default)]
    groups: Vec<Group>,
}

/// `/api/groups` endpoints.
#[derive(Debug, Clone)]
pub struct GroupsService {
    client: Client,
}

impl GroupsService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<Vec<Group>> {
        let list: Option<GroupList> = self.client.get("/api/groups").await?;
        Ok(list.map(|l| l.groups).unwrap_or_default())
    }

    /// Fetch a group; `expand` also returns its members and mappings.
    pub async fn get(&self, id: &str, expand: bool) -> Result<Group> {
        let mut endpoint = format!("/api/groups/{id}");
        if expand {
            endpoint.push_str("?expand");
        }
        require_body(self.client.get(&endpoint).await?, &endpoint)
    }

    pub async fn create(&self, name: &str, description: &str) -> Result<Group> {
        let body = GroupBody { name, description };
        require_body(self.client.post("/api/groups", &body).await?, "/api/groups")
    }

    /// Replace the name and description of `group`.
    pub async fn update(&self, group: &Group) -> Result<Group> {
        let endpoint = format!("/api/groups/{}", group.id);
        let body = GroupBody {
            name: &group.name,
            description: &group.description,
        };
        require_body(self.client.put(&endpoint, &body).await?, &endpoint)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/api/groups/{id}"))
            .await?;
        Ok(())
    }

    pub async fn get_mappings(&self, id: &str) -> Result<Vec<Mapping>> {
        let endpoint = format!("/api/groups/{id}/mappings");
        Ok(self.client.get(&endpoint).await?.unwrap_or_default())
    }

    pub async fn create_mappings(&self, id: &str, mappings: &[Mapping]) -> Result<Vec<Mapping>> {
        let endpoint = format!("/api/groups/{id}/mappings");
        Ok(self.client.patch(&endpoint, mappings).await?.unwrap_or_default())
    }

    /// Remove mappings by id.
    pub async fn delete_mappings(&self, id: &str, mapping_ids: &[String]) -> Result<()> {
        self.client
            .delete_with_body::<_, Value>(&format!("/api/groups/{id}/mappings"), mapping_ids)
            .await?;
        Ok(())
    }

    pub async fn get_members(&self, id: &str) -> Result<GroupMembers> {
        let endpoint = format!("/api/groups/{id}/members");
        Ok(self.client.get(&endpoint).await?.unwrap_or_default())
    }

    pub async fn add_members(&self, id: &str, user_ids: &[String]) -> Result<()> {
        self.client
            .patch::<_, Value>(&format!("/api/groups/{id}/members"), user_ids)
            .await?;
        Ok(())
    }

    pub async fn get_roles(&self, id: &str) -> Result<Vec<Role>> {
        let endpoint = format!("/api/groups/{id}/roles");
        Ok(self.client.get(&endpoint).await?.unwrap_or_default())
    }

    pub async fn add_roles(&self, id: &str, role_ids: &[String]) -> Result<()> {
        self.client
            .patch::<_, Value>(&format!("/api/groups/{id}/roles"), role_ids)
            .await?;
        Ok(())
    }

    pub async fn delete_roles(&self, id: &str, role_ids: &[String]) -> Result<()> {
        self.client
            .delete_with_body::<_, Value>(&format!("/api/groups/{id}/roles"), role_ids)
            .await?;
        Ok(())
    }
}
