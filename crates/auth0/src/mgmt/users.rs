use auth0_transport::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{is_zero, with_query};
use crate::{error::Result, require_body};

/// A user in Auth0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "user_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub email_verified: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub phone_verified: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub picture: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nickname: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub multifactor: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_login: String,
    #[serde(rename = "logins_count", skip_serializing_if = "is_zero")]
    pub login_count: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub blocked: bool,
    #[serde(rename = "given_name", skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(rename = "family_name", skip_serializing_if = "String::is_empty")]
    pub last_name: String,
}

/// One identity provider account linked to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connection: String,
    #[serde(rename = "user_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(rename = "isSocial", skip_serializing_if = "std::ops::Not::not")]
    pub is_social: bool,
}

/// A page of search results. Without `include_totals` only `users` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersPage {
    pub start: u32,
    pub limit: u32,
    pub length: u32,
    pub total: u32,
    pub users: Vec<User>,
}

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserOpts {
    #[serde(rename = "user_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connection: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub email_verified: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verify_email: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub phone_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub family_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub given_name: String,
}

/// Fields accepted when updating a user. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdateOpts {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub blocked: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub email_verified: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verify_email: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub phone_verified: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verify_phone_number: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verify_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connection: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
}

/// Query parameters for [`UsersService::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchUsersOpts {
    #[serde(skip_serializing_if = "is_zero")]
    pub per_page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub page: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_totals: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connection: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fields: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_fields: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub q: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search_engine: String,
}

/// `/users` endpoints.
#[derive(Debug, Clone)]
pub struct UsersService {
    client: Client,
}

impl UsersService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Every user in the tenant, fetched page by page.
    pub async fn get_all(&self) -> Result<Vec<User>> {
        Ok(self.client.get_paged("/users").await?)
    }

    pub async fn get(&self, user_id: &str) -> Result<User> {
        let endpoint = format!("/users/{user_id}");
        require_body(self.client.get(&endpoint).await?, &endpoint)
    }

    /// One page of users matching `opts`.
    pub async fn search(&self, opts: &SearchUsersOpts) -> Result<UsersPage> {
        let endpoint = with_query("/users", opts)?;
        if opts.include_totals {
            return Ok(self.client.get(&endpoint).await?.unwrap_or_default());
        }
        let users: Option<Vec<User>> = self.client.get(&endpoint).await?;
        Ok(UsersPage {
            users: users.unwrap_or_default(),
            ..UsersPage::default()
        })
    }

    pub async fn create(&self, opts: &UserOpts) -> Result<User> {
        require_body(self.client.post("/users", opts).await?, "/users")
    }

    pub async fn update(&self, user_id: &str, opts: &UserUpdateOpts) -> Result<User> {
        let endpoint = format!("/users/{user_id}");
        require_body(self.client.patch(&endpoint, opts).await?, &endpoint)
    }

    pub async fn delete(&self, user_id: &str) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/users/{user_id}"))
            .await?;
        Ok(())
    }

    pub async fn delete_with_body<B: Serialize + ?Sized>(&self, user_id: &str, body: &B) -> Result<()> {
        self.client
            .delete_with_body::<B, Value>(&format!("/users/{user_id}"), body)
            .await?;
        Ok(())
    }

    /// Total number of users in the tenant.
    pub async fn count(&self) -> Result<u64> {
        Ok(self.client.count("/users").await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_opts_encoding() {
        let opts = SearchUsersOpts {
            per_page: 50,
            include_totals: true,
            q: "email:\"a@b.com\"".to_string(),
            search_engine: "v3".to_string(),
            ..SearchUsersOpts::default()
        };
        assert_eq!(
            with_query("/users", &opts).unwrap(),
            "/users?per_page=50&include_totals=true&q=email%3A%22a%40b.com%22&search_engine=v3"
        );
        assert_eq!(
            with_query("/users", &SearchUsersOpts::default()).unwrap(),
            "/users"
        );
    }

    #[test]
    fn test_user_wire_names() {
        let user: User = serde_json::from_str(
            r#"{"user_id":"auth0|1","email":"a@b.com","logins_count":3,"given_name":"Ada",
                "identities":[{"connection":"db","user_id":"1","provider":"auth0","isSocial":false}]}"#,
        )
        .unwrap();

        assert_eq!(user.id, "auth0|1");
        assert_eq!(user.login_count, 3);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.identities[0].provider, "auth0");
    }

    #[test]
    fn test_update_opts_omit_unset() {
        let opts = UserUpdateOpts {
            blocked: true,
            ..UserUpdateOpts::default()
        };
        assert_eq!(serde_json::to_string(&opts).unwrap(), r#"{"blocked":true}"#);
    }
}
