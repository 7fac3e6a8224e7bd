//! Authorization Extension API services.
//!
//! The extension is hosted outside the tenant (usually on webtask.io), so its
//! client is rooted at the configured authorization URL and every path starts
//! with `/api`.

mod groups;
mod permissions;
mod roles;
mod users;

use auth0_transport::Client;

pub use groups::{Group, GroupMembers, GroupsService, Mapping};
pub use permissions::{Permission, PermissionsService};
pub use roles::{Role, RolesService};
pub use users::UsersService;

/// Gateway to the Authorization Extension resources.
#[derive(Debug, Clone)]
pub struct AuthorizationService {
    client: Client,
}

impl AuthorizationService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn groups(&self) -> GroupsService {
        GroupsService::new(self.client.clone())
    }

    pub fn roles(&self) -> RolesService {
        RolesService::new(self.client.clone())
    }

    pub fn permissions(&self) -> PermissionsService {
        PermissionsService::new(self.client.clone())
    }

    pub fn users(&self) -> UsersService {
        UsersService::new(self.client.clone())
    }
}
