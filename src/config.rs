use std::env;

use chrono::FixedOffset;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub http_timeout_secs: u64,
    pub salesforce: SalesforceConfig,
    pub stripe: StripeConfig,
    pub clerk: ClerkConfig,
    pub membership: MembershipConfig,
}

#[derive(Clone, Debug)]
pub struct SalesforceConfig {
    pub login_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub api_version: String,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub currency: String,
    pub ledger_retries: u32,
    pub ledger_retry_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ClerkConfig {
    pub secret_key: String,
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct MembershipConfig {
    pub utc_offset_hours: i32,
}

impl MembershipConfig {
    /// Fixed organizational timezone used for membership start dates.
    pub fn utc_offset(&self) -> FixedOffset {
        let hours = self.utc_offset_hours.clamp(-12, 14);
        FixedOffset::east_opt(hours * 3600).expect("clamped offset is in range")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 3000),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000,http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            http_timeout_secs: env_or_parse("HTTP_TIMEOUT_SECS", 20),
            salesforce: SalesforceConfig {
                login_url: env_or("SALESFORCE_LOGIN_URL", "https://login.salesforce.com"),
                client_id: env_or("SALESFORCE_CLIENT_ID", ""),
                client_secret: env_or("SALESFORCE_CLIENT_SECRET", ""),
                username: env_or("SALESFORCE_USERNAME", ""),
                password: env_or("SALESFORCE_PASSWORD", ""),
                api_version: env_or("SALESFORCE_API_VERSION", "v59.0"),
            },
            stripe: StripeConfig {
                secret_key: env_or("STRIPE_SECRET_KEY", ""),
                currency: env_or("STRIPE_CURRENCY", "usd"),
                ledger_retries: env_or_parse("STRIPE_LEDGER_RETRIES", 5),
                ledger_retry_delay_ms: env_or_parse("STRIPE_LEDGER_RETRY_DELAY_MS", 2500),
            },
            clerk: ClerkConfig {
                secret_key: env_or("CLERK_SECRET_KEY", ""),
                api_url: env_or("CLERK_API_URL", "https://api.clerk.com/v1"),
            },
            membership: MembershipConfig {
                utc_offset_hours: env_or_parse("MEMBERSHIP_UTC_OFFSET_HOURS", -8),
            },
        }
    }
}
