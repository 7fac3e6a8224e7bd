use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{is_zero, with_query};
use crate::error::Result;

/// A tenant log event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    /// RFC 3339 timestamp, as sent by the API.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
    /// Event code, e.g. `s` for a successful login.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_info: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchLogsOpts {
    #[serde(skip_serializing_if = "is_zero")]
    pub page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub per_page: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fields: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_fields: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_totals: bool,
    /// Log id to start from when paging by checkpoint.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub take: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub q: String,
}

/// `/logs` endpoint.
#[derive(Debug, Clone)]
pub struct LogsService {
    client: Client,
}

impl LogsService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// One request's worth of log entries matching `opts`.
    pub async fn search(&self, opts: &SearchLogsOpts) -> Result<Vec<LogEntry>> {
        let endpoint = with_query("/logs", opts)?;
        Ok(self.client.get(&endpoint).await?.unwrap_or_default())
    }
}
