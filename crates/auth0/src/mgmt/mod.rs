//! Management API (`/api/v2`) services.

mod connections;
mod device_credentials;
mod logs;
mod users;

use auth0_transport::{Client, TransportError};
use serde::Serialize;

use crate::error::Result;

pub use connections::{
    Connection, ConnectionOpts, ConnectionUpdateOpts, ConnectionsPage, ConnectionsService,
    SearchConnectionsOpts,
};
pub use device_credentials::{DeviceCredentialsService, TokenData};
pub use logs::{LogEntry, LogsService, SearchLogsOpts};
pub use users::{
    Identity, SearchUsersOpts, User, UserOpts, UserUpdateOpts, UsersPage, UsersService,
};

/// Gateway to the Management API resources.
#[derive(Debug, Clone)]
pub struct ManagementService {
    client: Client,
}

impl ManagementService {
    /// Wrap a client whose base URL is the tenant's `/api/v2`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client, for endpoints without a dedicated service.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn users(&self) -> UsersService {
        UsersService::new(self.client.clone())
    }

    pub fn connections(&self) -> ConnectionsService {
        ConnectionsService::new(self.client.clone())
    }

    pub fn logs(&self) -> LogsService {
        LogsService::new(self.client.clone())
    }

    pub fn device_credentials(&self) -> DeviceCredentialsService {
        DeviceCredentialsService::new(self.client.clone())
    }
}

pub(crate) fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Append the URL-encoded form of `opts` to `path`, if it encodes to anything.
pub(crate) fn with_query<T: Serialize>(path: &str, opts: &T) -> Result<String> {
    let query = serde_urlencoded::to_string(opts)
        .map_err(|e| TransportError::request(format!("cannot encode query: {e}")))?;
    Ok(join_query(path, &query))
}

pub(crate) fn join_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}
