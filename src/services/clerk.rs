use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::ClerkConfig;
use crate::error::{AppError, AppResult};

/// Clerk admin-API gateway: account creation and deletion.
#[derive(Clone)]
pub struct ClerkClient {
    config: ClerkConfig,
    http: reqwest::Client,
}

impl ClerkClient {
    pub fn new(config: ClerkConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn require_key(&self) -> AppResult<()> {
        if self.config.secret_key.is_empty() {
            return Err(AppError::Configuration(
                "Missing Clerk configuration: CLERK_SECRET_KEY".into(),
            ));
        }
        Ok(())
    }

    /// Delete an account. Used when a signup's CRM record could not be
    /// created after the account already existed, and by administrators
    /// cleaning up orphaned accounts.
    pub async fn delete_user(&self, user_id: &str) -> AppResult<Value> {
        self.require_key()?;
        let url = format!("{}/users/{}", self.config.api_url, user_id);
        let resp = self
            .http
            .delete(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Clerk request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Clerk user {user_id} not found")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Clerk response parse failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Identity(format!(
                "Failed to delete user: {}",
                clerk_error_message(&body)
            )));
        }
        Ok(body)
    }
}

/// The slice of the identity provider the signup saga depends on.
pub trait IdentityApi {
    fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: Option<&str>,
    ) -> impl std::future::Future<Output = AppResult<String>> + Send;
}

impl IdentityApi for ClerkClient {
    /// Create an account. A caller-supplied password comes from a flow that
    /// already trusts the member's email, so the provider is told to skip its
    /// own strength checks and treat the address as verified; without a
    /// password the provider runs its usual verification before first login.
    async fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: Option<&str>,
    ) -> AppResult<String> {
        self.require_key()?;

        let mut body = json!({
            "email_address": [email],
            "first_name": first_name,
            "last_name": last_name,
        });
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            body["password"] = json!(pw);
            body["skip_password_checks"] = json!(true);
            body["email_verified"] = json!(true);
        }

        let url = format!("{}/users", self.config.api_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Failed to create user: {e}")))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Failed to create user: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Identity(format!(
                "Failed to create user: {}",
                clerk_error_message(&payload)
            )));
        }

        payload["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::Identity("Clerk did not return a user id".into()))
    }
}

/// Normalize Clerk's error payload (`{"errors": [{"message", "long_message"}]}`)
/// into a single message.
pub(crate) fn clerk_error_message(body: &Value) -> String {
    let first = &body["errors"][0];
    first["long_message"]
        .as_str()
        .or_else(|| first["message"].as_str())
        .unwrap_or("unknown identity provider error")
        .to_string()
}
