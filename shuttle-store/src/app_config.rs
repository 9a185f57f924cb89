use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
    pub catalog: CatalogConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub hold_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
    /// Flat fee per booking in minor units
    #[serde(default)]
    pub booking_fee: i64,
}

fn default_currency() -> String {
    "GBP".to_string()
}

fn default_reference_prefix() -> String {
    "BBE".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// JSON file with the scheduled trips
    pub trips_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub callback_base_url: String,
    pub failure_threshold: u32,
    pub reset_timeout_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SHUTTLE__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("SHUTTLE").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let rules = &self.business_rules;
        if rules.hold_ttl_seconds == 0 {
            return Err(config::ConfigError::Message(
                "business_rules.hold_ttl_seconds must be greater than zero".into(),
            ));
        }
        if rules.sweep_interval_seconds == 0 {
            return Err(config::ConfigError::Message(
                "business_rules.sweep_interval_seconds must be greater than zero".into(),
            ));
        }
        if rules.booking_fee < 0 {
            return Err(config::ConfigError::Message("business_rules.booking_fee cannot be negative".into()));
        }
        let prefix = rules.reference_prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(config::ConfigError::Message(format!(
                "business_rules.reference_prefix '{}' must be non-empty and alphanumeric",
                rules.reference_prefix
            )));
        }
        if self.payment.failure_threshold == 0 {
            return Err(config::ConfigError::Message("payment.failure_threshold must be at least 1".into()));
        }
        Ok(())
    }
}
