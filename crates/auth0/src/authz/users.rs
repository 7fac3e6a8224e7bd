use auth0_transport::Client;
use serde::Serialize;
use serde_json::Value;

use super::{Group, Role};
use crate::error::{Auth0Error, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyRequest<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    connection_name: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    groups: &'a [String],
}

/// Group and role membership of users, under `/api/users`.
#[derive(Debug, Clone)]
pub struct UsersService {
    client: Client,
}

impl UsersService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Groups the user belongs to directly.
    pub async fn get_groups(&self, user_id: &str, expand: bool) -> Result<Vec<Group>> {
        let mut endpoint = format!("/api/users/{user_id}/groups");
        if expand {
            endpoint.push_str("?expand");
        }
        let groups = self
            .client
            .get(&endpoint)
            .await
            .map_err(Auth0Error::context("cannot get groups for user"))?;
        Ok(groups.unwrap_or_default())
    }

    pub async fn add_groups(&self, user_id: &str, group_ids: &[String]) -> Result<()> {
        self.client
            .patch::<_, Value>(&format!("/api/users/{user_id}/groups"), group_ids)
            .await
            .map_err(Auth0Error::context("cannot add groups for user"))?;
        Ok(())
    }

    /// Groups the user belongs to, including nested groups.
    pub async fn get_all_groups(&self, user_id: &str) -> Result<Vec<Group>> {
        let groups = self
            .client
            .get(&format!("/api/users/{user_id}/groups/calculate"))
            .await
            .map_err(Auth0Error::context("cannot get all groups for user"))?;
        Ok(groups.unwrap_or_default())
    }

    /// Roles assigned to the user directly.
    pub async fn get_roles(&self, user_id: &str) -> Result<Vec<Role>> {
        let roles = self
            .client
            .get(&format!("/api/users/{user_id}/roles"))
            .await
            .map_err(Auth0Error::context("cannot get roles for user"))?;
        Ok(roles.unwrap_or_default())
    }

    pub async fn add_roles(&self, user_id: &str, role_ids: &[String]) -> Result<()> {
        self.client
            .patch::<_, Value>(&format!("/api/users/{user_id}/roles"), role_ids)
            .await
            .map_err(Auth0Error::context("cannot add roles for user"))?;
        Ok(())
    }

    pub async fn remove_roles(&self, user_id: &str, role_ids: &[String]) -> Result<()> {
        self.client
            .delete_with_body::<_, Value>(&format!("/api/users/{user_id}/roles"), role_ids)
            .await
            .map_err(Auth0Error::context("cannot remove roles for user"))?;
        Ok(())
    }

    /// Roles the user holds directly or through group membership.
    pub async fn get_all_roles(&self, user_id: &str) -> Result<Vec<Role>> {
        let roles = self
            .client
            .get(&format!("/api/users/{user_id}/roles/calculate"))
            .await
            .map_err(Auth0Error::context("cannot get all roles for user"))?;
        Ok(roles.unwrap_or_default())
    }

    /// Run the extension's authorization policy for the user as if they
    /// logged in through `connection` while in `groups`.
    pub async fn exec_auth_policy(
        &self,
        user_id: &str,
        policy_id: &str,
        connection: &str,
        groups: &[String],
    ) -> Result<()> {
        let body = PolicyRequest {
            connection_name: connection,
            groups,
        };
        self.client
            .post::<_, Value>(&format!("/api/users/{user_id}/policy/{policy_id}"), &body)
            .await
            .map_err(Auth0Error::context("cannot execute policy for user"))?;
        Ok(())
    }
}
