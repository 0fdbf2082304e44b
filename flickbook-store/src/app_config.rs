use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub metadata: MetadataConfig,
    pub assistant: AssistantConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Externally reachable base URL, used to build checkout return URLs.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string, or `memory` for the in-process store.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    pub pepper: String,
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    Mock,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub provider: PaymentProvider,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub webhook_secret: String,
    pub ticket_price_cents: i64,
    pub currency: String,
    #[serde(default = "default_stripe_api")]
    pub api_base: String,
}

fn default_stripe_api() -> String { "https://api.stripe.com".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataConfig {
    pub api_key: String,
    pub base_url: String,
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    pub url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub admin_username: String,
    pub admin_password: String,
    #[serde(default)]
    pub titles: Vec<String>,
    pub theatrical_days: i64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `FLICKBOOK__AUTH__JWT_SECRET=...` sets `auth.jwt_secret`
            .add_source(config::Environment::with_prefix("FLICKBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
