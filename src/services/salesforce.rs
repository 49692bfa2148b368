use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SalesforceConfig;
use crate::error::{AppError, AppResult};

/// Refresh this long before the token actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 300;

const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Clone, Debug)]
pub struct CachedToken {
    pub access_token: String,
    pub instance_url: String,
    pub expires_at: Instant,
}

/// Process-wide bearer-token cache for the Salesforce REST API.
///
/// Owned explicitly and handed to the client at construction. The lock is
/// only held across in-memory reads and writes, never across an await; a
/// race between two expiring requests costs one duplicate token fetch.
#[derive(Clone, Default)]
pub struct TokenCache {
    inner: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, now: Instant) -> Option<CachedToken> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().filter(|t| now < t.expires_at).cloned()
    }

    pub fn store(&self, token: CachedToken) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token);
    }
}

pub fn token_expiry(now: Instant, expires_in_secs: u64) -> Instant {
    now + Duration::from_secs(expires_in_secs.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS))
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    instance_url: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

/// Salesforce REST gateway: password-grant OAuth with a cached bearer token,
/// generic verb calls against the instance URL returned by the grant, and
/// typed helpers for the objects this system touches.
#[derive(Clone)]
pub struct SalesforceClient {
    config: SalesforceConfig,
    http: reqwest::Client,
    tokens: TokenCache,
}

impl SalesforceClient {
    pub fn new(config: SalesforceConfig, http: reqwest::Client, tokens: TokenCache) -> Self {
        Self {
            config,
            http,
            tokens,
        }
    }

    fn require_secrets(&self) -> AppResult<()> {
        let required = [
            ("SALESFORCE_CLIENT_ID", &self.config.client_id),
            ("SALESFORCE_CLIENT_SECRET", &self.config.client_secret),
            ("SALESFORCE_USERNAME", &self.config.username),
            ("SALESFORCE_PASSWORD", &self.config.password),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(AppError::Configuration(format!(
                    "Missing Salesforce configuration: {name}"
                )));
            }
        }
        Ok(())
    }

    async fn access_token(&self) -> AppResult<CachedToken> {
        if let Some(token) = self.tokens.get(Instant::now()) {
            return Ok(token);
        }
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> AppResult<CachedToken> {
        self.require_secrets()?;

        let url = format!("{}/services/oauth2/token", self.config.login_url);
        let form = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let resp = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Authentication(format!("Salesforce token request failed: {e}")))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("Salesforce token response parse failed: {e}")))?;

        if !status.is_success() {
            let msg = body["error_description"]
                .as_str()
                .unwrap_or("Salesforce authentication failed");
            return Err(AppError::Authentication(msg.to_string()));
        }

        let grant: TokenGrant = serde_json::from_value(body)
            .map_err(|e| AppError::Authentication(format!("Unexpected token grant shape: {e}")))?;

        let token = CachedToken {
            access_token: grant.access_token,
            // Trust the instance URL returned by the grant; it is
            // authoritative for the org the token belongs to.
            instance_url: grant.instance_url,
            expires_at: token_expiry(Instant::now(), grant.expires_in),
        };
        self.tokens.store(token.clone());
        tracing::debug!("Salesforce access token refreshed");
        Ok(token)
    }

    /// Generic authenticated call against a REST endpoint path
    /// (e.g. `/services/data/v59.0/sobjects/Contact/`).
    pub async fn call_api(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let token = self.access_token().await?;
        let url = format!("{}{}", token.instance_url, endpoint);

        let mut req = self
            .http
            .request(method, &url)
            .bearer_auth(&token.access_token);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Crm(format!("Salesforce request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::Crm(format!("Salesforce response read failed: {e}")))?;

        // PATCH and DELETE answer 204 with an empty body.
        let payload: Value = if text.is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(v) => v,
                // Proxies occasionally answer errors in plain text.
                Err(_) if !status.is_success() => return Err(AppError::Crm(text)),
                Err(_) => Value::String(text),
            }
        };

        if !status.is_success() {
            return Err(AppError::Crm(crm_error_message(&payload)));
        }
        Ok(payload)
    }

    /// Run a SOQL query. reqwest handles the URL encoding of the statement.
    pub async fn query(&self, soql: &str) -> AppResult<Value> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/services/data/{}/query",
            token.instance_url, self.config.api_version
        );

        let resp = self
            .http
            .get(&url)
            .query(&[("q", soql)])
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::Crm(format!("Salesforce request failed: {e}")))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Crm(format!("Salesforce response parse failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Crm(crm_error_message(&payload)));
        }
        Ok(payload)
    }

    fn sobject_path(&self, object: &str) -> String {
        format!("/services/data/{}/sobjects/{}/", self.config.api_version, object)
    }

    fn sobject_id_path(&self, object: &str, id: &str) -> String {
        format!(
            "/services/data/{}/sobjects/{}/{}",
            self.config.api_version, object, id
        )
    }

    async fn create_record(&self, object: &str, fields: &Value) -> AppResult<String> {
        let resp = self
            .call_api(Method::POST, &self.sobject_path(object), Some(fields))
            .await?;
        resp["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::Crm(format!("Salesforce did not return a {object} id")))
    }

    pub async fn find_contact_by_email(&self, email: &str) -> AppResult<Option<Value>> {
        let soql = format!(
            "SELECT Id, AccountId, FirstName, LastName, Email, Phone, Clerk_User_ID__c \
             FROM Contact WHERE Email = '{}' LIMIT 1",
            soql_quote(email)
        );
        let result = self.query(&soql).await?;
        Ok(result["records"].as_array().and_then(|r| r.first()).cloned())
    }

    pub async fn find_contact_by_clerk_id(&self, clerk_user_id: &str) -> AppResult<Option<Value>> {
        let soql = format!(
            "SELECT Id, AccountId, FirstName, LastName, Email, Phone, Clerk_User_ID__c \
             FROM Contact WHERE Clerk_User_ID__c = '{}' LIMIT 1",
            soql_quote(clerk_user_id)
        );
        let result = self.query(&soql).await?;
        Ok(result["records"].as_array().and_then(|r| r.first()).cloned())
    }

    pub async fn opportunities_for_contact(&self, contact_id: &str) -> AppResult<Vec<Value>> {
        let soql = format!(
            "SELECT Id, Name, Amount, StageName, CloseDate, \
             Membership_Start_Date__c, Membership_End_Date__c \
             FROM Opportunity WHERE ContactId = '{}' ORDER BY CloseDate DESC",
            soql_quote(contact_id)
        );
        let result = self.query(&soql).await?;
        Ok(result["records"].as_array().cloned().unwrap_or_default())
    }
}

/// The slice of the CRM the signup saga depends on. Split out so saga tests
/// can drive every stage outcome without a Salesforce org.
pub trait CrmApi {
    fn create_contact(&self, fields: &Value) -> impl std::future::Future<Output = AppResult<String>> + Send;
    fn get_contact(&self, id: &str) -> impl std::future::Future<Output = AppResult<Value>> + Send;
    fn update_contact(
        &self,
        id: &str,
        fields: &Value,
    ) -> impl std::future::Future<Output = AppResult<()>> + Send;
    fn create_opportunity(&self, fields: &Value) -> impl std::future::Future<Output = AppResult<String>> + Send;
}

impl CrmApi for SalesforceClient {
    async fn create_contact(&self, fields: &Value) -> AppResult<String> {
        self.create_record("Contact", fields).await
    }

    async fn get_contact(&self, id: &str) -> AppResult<Value> {
        self.call_api(Method::GET, &self.sobject_id_path("Contact", id), None)
            .await
    }

    async fn update_contact(&self, id: &str, fields: &Value) -> AppResult<()> {
        self.call_api(
            Method::PATCH,
            &self.sobject_id_path("Contact", id),
            Some(fields),
        )
        .await?;
        Ok(())
    }

    async fn create_opportunity(&self, fields: &Value) -> AppResult<String> {
        self.create_record("Opportunity", fields).await
    }
}

/// Collapse the CRM's error payload shapes into one message. Salesforce
/// returns an array of `{message, errorCode}` for REST errors; the token
/// endpoint and proxies return flat objects.
pub(crate) fn crm_error_message(body: &Value) -> String {
    if let Some(first) = body.as_array().and_then(|a| a.first()) {
        if let Some(msg) = first["message"].as_str() {
            return msg.to_string();
        }
    }
    body["error"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .unwrap_or("Salesforce API error")
        .to_string()
}

/// Escape a string literal for embedding in a SOQL WHERE clause.
pub(crate) fn soql_quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
