//! Password authentication and the signed-in user
//!
//! Sign-in goes to the backend's auth endpoints. The role that drives routing
//! and capabilities comes from the `user_roles` table, not from the auth user.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::{MediDashError, Result};
use crate::models::Role;
use crate::query::QueryBuilder;
use crate::repository::DataClient;
use crate::rest::api_error;
use crate::schema::user_roles;

/// Identity returned by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens for a signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Signed-in user together with their role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    /// `None` when no role row exists or it holds an unknown value
    pub role: Option<Role>,
}

impl CurrentUser {
    /// Two-letter avatar initials taken from the email
    #[must_use]
    pub fn initials(&self) -> String {
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => email.chars().take(2).collect::<String>().to_uppercase(),
            _ => "U".to_string(),
        }
    }

    /// Role badge text, empty without a role
    #[must_use]
    pub fn role_label(&self) -> &'static str {
        self.role.map_or("", |role| role.display_name())
    }

    /// Part of the email before `@`, used as a default display name
    #[must_use]
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
    }
}

/// Resolve the role of `user` from the `user_roles` table
pub async fn load_current_user(client: &dyn DataClient, user: &AuthUser) -> Result<CurrentUser> {
    let query = QueryBuilder::new().select(&[user_roles::ROLE]).eq(user_roles::USER_ID, user.id);
    let rows = client.select(user_roles::TABLE, &query).await?;

    let role = match rows.as_slice() {
        [] => None,
        [row] => {
            let raw = row.get(user_roles::ROLE).and_then(Value::as_str).unwrap_or_default();
            let role = Role::parse_lenient(raw);
            if role.is_none() {
                warn!(user_id = %user.id, role = raw, "Ignoring unknown role value");
            }
            role
        },
        rows => {
            return Err(MediDashError::UnexpectedResponse {
                table: user_roles::TABLE.to_string(),
                detail: format!("user {} has {} role rows", user.id, rows.len()),
            })
        },
    };

    debug!(user_id = %user.id, role = ?role, "Loaded current user");
    Ok(CurrentUser { id: user.id, email: user.email.clone(), role })
}

/// Password sign-in against an auth service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self, session: &Session) -> Result<()>;

    /// The user owning `access_token`
    async fn user(&self, access_token: &str) -> Result<AuthUser>;
}

/// [`AuthProvider`] over `{url}/auth/v1`
#[derive(Debug, Clone)]
pub struct RestAuth {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl RestAuth {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let session: Session = response.json().await?;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .http
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        info!(user_id = %session.user.id, "Signed out");
        Ok(())
    }

    async fn user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>) -> CurrentUser {
        CurrentUser { id: Uuid::nil(), email: email.map(str::to_string), role: None }
    }

    #[test]
    fn test_initials() {
        assert_eq!(user(Some("jane@clinic.org")).initials(), "JA");
        assert_eq!(user(Some("x")).initials(), "X");
        assert_eq!(user(None).initials(), "U");
    }

    #[test]
    fn test_role_label() {
        let mut current = user(None);
        assert_eq!(current.role_label(), "");
        current.role = Some(Role::SuperAdmin);
        assert_eq!(current.role_label(), "Super Admin");
    }

    #[test]
    fn test_session_parses_token_response() {
        let body = r#"{
            "access_token": "abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "def",
            "user": {"id": "11111111-1111-4111-8111-111111111111", "email": "a@b.c", "aud": "authenticated"}
        }"#;
        let session: Session = serde_json::from_str(body).unwrap();
        assert_eq!(session.expires_in, 3600);
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn test_mock_provider_failure_propagates() {
        let mut auth = MockAuthProvider::new();
        auth.expect_sign_in()
            .returning(|_, _| Err(MediDashError::Api { status: 400, message: "Invalid login credentials".into() }));
        let err = auth.sign_in("a@b.c", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }
}
