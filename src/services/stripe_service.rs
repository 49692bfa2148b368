use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};

/// Lightweight Stripe client wrapping raw HTTP calls.
/// This avoids the compile-time weight of a full SDK while providing the
/// three operations the signup flow needs: payment intents, customers, and
/// intent retrieval with the charge ledger expanded.
#[derive(Clone)]
pub struct StripeClient {
    config: StripeConfig,
    http: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn require_key(&self) -> AppResult<()> {
        if self.config.secret_key.is_empty() {
            return Err(AppError::Configuration(
                "Missing Stripe configuration: STRIPE_SECRET_KEY".into(),
            ));
        }
        Ok(())
    }

    async fn post(&self, path: &str, params: &[(String, String)]) -> AppResult<Value> {
        self.require_key()?;
        let url = format!("https://api.stripe.com/v1{path}");
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.config.secret_key, Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Stripe request failed: {e}")))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("Stripe response parse failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Payment(stripe_error_message(&body)));
        }
        Ok(body)
    }

    async fn get(&self, path: &str) -> AppResult<Value> {
        self.require_key()?;
        let url = format!("https://api.stripe.com/v1{path}");
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.config.secret_key, Option::<&str>::None)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Stripe request failed: {e}")))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("Stripe response parse failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Payment(stripe_error_message(&body)));
        }
        Ok(body)
    }

    /// Create a payment intent in the configured currency with automatic
    /// payment-method selection. The returned intent carries the client
    /// secret the SPA needs for confirmation.
    pub async fn create_payment_intent(
        &self,
        amount_dollars: f64,
        email: &str,
        metadata: &[(String, String)],
    ) -> AppResult<Value> {
        let mut params = vec![
            ("amount".to_string(), minor_units(amount_dollars).to_string()),
            ("currency".to_string(), self.config.currency.clone()),
            ("receipt_email".to_string(), email.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }
        self.post("/payment_intents", &params).await
    }

    pub async fn create_customer(
        &self,
        email: &str,
        name: &str,
        metadata: &[(String, String)],
    ) -> AppResult<Value> {
        let mut params = vec![
            ("email".to_string(), email.to_string()),
            ("name".to_string(), name.to_string()),
        ];
        for (key, value) in metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }
        self.post("/customers", &params).await
    }

    /// Retrieve a payment intent with its charge and the charge's balance
    /// transaction expanded inline.
    ///
    /// Stripe populates the balance transaction asynchronously after charge
    /// capture, so an unpopulated ledger is polled, not failed: up to the
    /// configured number of extra attempts with a fixed delay, returning the
    /// latest response either way.
    pub async fn get_payment_intent(&self, id: &str) -> AppResult<Value> {
        let path = format!(
            "/payment_intents/{id}?expand[]=latest_charge&expand[]=latest_charge.balance_transaction"
        );
        poll_for_ledger(
            self.config.ledger_retries,
            Duration::from_millis(self.config.ledger_retry_delay_ms),
            || self.get(&path),
        )
        .await
    }
}

/// Stripe takes integer minor units; membership prices are whole dollars but
/// net amounts from the SPA can carry cents.
pub(crate) fn minor_units(amount_dollars: f64) -> i64 {
    (amount_dollars * 100.0).round() as i64
}

/// A balance transaction counts as populated only when it is an expanded
/// object, not a bare id string and not null.
pub(crate) fn ledger_expanded(intent: &Value) -> bool {
    intent["latest_charge"]["balance_transaction"].is_object()
}

/// Bounded poll for the ledger entry. The fetch operation is a parameter so
/// tests can drive the loop with a stub and zero delay. A fetch error is a
/// hard failure and propagates immediately; only a missing ledger retries.
pub(crate) async fn poll_for_ledger<F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut fetch: F,
) -> AppResult<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<Value>>,
{
    let mut intent = fetch().await?;
    let mut attempts = 1u32;
    while !ledger_expanded(&intent) && attempts <= max_retries {
        tokio::time::sleep(delay).await;
        intent = fetch().await?;
        attempts += 1;
    }
    if !ledger_expanded(&intent) {
        tracing::warn!("payment ledger not populated after {attempts} attempts");
    }
    Ok(intent)
}

fn stripe_error_message(body: &Value) -> String {
    body["error"]["message"]
        .as_str()
        .unwrap_or("Unknown Stripe error")
        .to_string()
}
