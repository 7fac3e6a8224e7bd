use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{is_zero, join_query, with_query};
use crate::{error::Result, require_body};

/// An identity provider connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub strategy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub realms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enabled_clients: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_domain_connection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionOpts {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enabled_clients: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_domain_connection: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub realms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Connection fields that can change after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionUpdateOpts {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enabled_clients: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_domain_connection: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub realms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsPage {
    pub start: u32,
    pub limit: u32,
    pub length: u32,
    pub total: u32,
    pub connections: Vec<Connection>,
}

/// Query parameters for [`ConnectionsService::search`].
///
/// Each entry of `strategy` becomes its own `strategy=` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchConnectionsOpts {
    #[serde(skip_serializing_if = "is_zero")]
    pub per_page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub page: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_totals: bool,
    #[serde(skip)]
    pub strategy: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fields: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_fields: bool,
}

impl SearchConnectionsOpts {
    fn endpoint(&self) -> Result<String> {
        let base = with_query("/connections", self)?;
        if self.strategy.is_empty() {
            return Ok(base);
        }

        let (path, query) = base.split_once('?').unwrap_or((base.as_str(), ""));
        let mut serializer = url::form_urlencoded::Serializer::for_suffix(query.to_string(), 0);
        for strategy in &self.strategy {
            serializer.append_pair("strategy", strategy);
        }
        Ok(join_query(path, &serializer.finish()))
    }
}

/// `/connections` endpoints.
#[derive(Debug, Clone)]
pub struct ConnectionsService {
    client: Client,
}

impl ConnectionsService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Every connection in the tenant.
    pub async fn get_all(&self) -> Result<Vec<Connection>> {
        Ok(self.client.get_paged("/connections").await?)
    }

    pub async fn get(&self, connection_id: &str) -> Result<Connection> {
        let endpoint = format!("/connections/{connection_id}");
        require_body(self.client.get(&endpoint).await?, &endpoint)
    }

    pub async fn search(&self, opts: &SearchConnectionsOpts) -> Result<ConnectionsPage> {
        let endpoint = opts.endpoint()?;
        if opts.include_totals {
            return Ok(self.client.get(&endpoint).await?.unwrap_or_default());
        }
        let connections: Option<Vec<Connection>> = self.client.get(&endpoint).await?;
        Ok(ConnectionsPage {
            connections: connections.unwrap_or_default(),
            ..ConnectionsPage::default()
        })
    }

    pub async fn create(&self, opts: &ConnectionOpts) -> Result<Connection> {
        require_body(self.client.post("/connections", opts).await?, "/connections")
    }

    pub async fn update(
        &self,
        connection_id: &str,
        opts: &ConnectionUpdateOpts,
    ) -> Result<Connection> {
        let endpoint = format!("/connections/{connection_id}");
        require_body(self.client.patch(&endpoint, opts).await?, &endpoint)
    }

    pub async fn delete(&self, connection_id: &str) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/connections/{connection_id}"))
            .await?;
        Ok(())
    }

    pub async fn delete_with_body<B: Serialize + ?Sized>(
        &self,
        connection_id: &str,
        body: &B,
    ) -> Result<()> {
        self.client
            .delete_with_body::<B, Value>(&format!("/connections/{connection_id}"), body)
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.client.count("/connections").await?)
    }
}
