use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::info;

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";

/// Application configuration, loaded from defaults, optional config files and
/// `APP__`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// When set, the schema bootstrap runs at startup. Intended for
    /// SQLite-backed development and test environments.
    pub auto_migrate: bool,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Shared secret with the identity provider. No default on purpose.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub jwt_expiration: i64,
    /// ISO 4217 code of the operating currency; all amounts are integers in
    /// its smallest denomination.
    pub currency: String,
    /// Allowed absolute difference between a client-declared total and the
    /// server-recomputed one before the checkout is rejected.
    pub order_total_tolerance_minor: i64,
    pub gateway_base_url: String,
    pub gateway_key_id: String,
    /// Also the HMAC key for payment signature verification.
    pub gateway_key_secret: String,
    pub gateway_timeout_secs: u64,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    /// Role claim required for administrative endpoints.
    pub admin_role: String,
    /// Upper bound for the administrative order listing.
    pub orders_list_limit: u64,
}

impl AppConfig {
    /// Minimal constructor used by tests and embedding callers; everything
    /// not passed in gets the same defaults `load_config` applies.
    pub fn new(
        database_url: impl Into<String>,
        jwt_secret: impl Into<String>,
        gateway_key_id: impl Into<String>,
        gateway_key_secret: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: 10,
            db_min_connections: 1,
            jwt_secret: jwt_secret.into(),
            jwt_expiration: 3600,
            currency: "INR".to_string(),
            order_total_tolerance_minor: 0,
            gateway_base_url: "https://api.razorpay.com".to_string(),
            gateway_key_id: gateway_key_id.into(),
            gateway_key_secret: gateway_key_secret.into(),
            gateway_timeout_secs: 10,
            email_api_url: None,
            email_api_key: None,
            email_from: "orders@example.com".to_string(),
            admin_role: "admin".to_string(),
            orders_list_limit: 50,
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] ConfigError),

    #[error("required configuration key '{0}' is not set")]
    Missing(&'static str),
}

/// Loads configuration for the environment selected via `RUN_ENV`/`APP_ENV`.
///
/// `jwt_secret` and the gateway credentials intentionally have no defaults;
/// they must come from a config file or the environment.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("auto_migrate", false)?
        .set_default("db_max_connections", 10)?
        .set_default("db_min_connections", 1)?
        .set_default("jwt_expiration", 3600)?
        .set_default("currency", "INR")?
        .set_default("order_total_tolerance_minor", 0)?
        .set_default("gateway_base_url", "https://api.razorpay.com")?
        .set_default("gateway_timeout_secs", 10)?
        .set_default("email_from", "orders@example.com")?
        .set_default("admin_role", "admin")?
        .set_default("orders_list_limit", 50)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    for key in ["jwt_secret", "gateway_key_id", "gateway_key_secret"] {
        if config.get_string(key).is_err() {
            return Err(AppConfigError::Missing(match key {
                "jwt_secret" => "jwt_secret",
                "gateway_key_id" => "gateway_key_id",
                _ => "gateway_key_secret",
            }));
        }
    }

    Ok(config.try_deserialize()?)
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when present.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("storefront_api={},tower_http=info", level));

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(directive))
            .json()
            .try_init();
    } else {
        let _ = fmt().with_env_filter(EnvFilter::new(directive)).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_documented_defaults() {
        let cfg = AppConfig::new(
            "sqlite::memory:",
            "secret",
            "key_id",
            "key_secret",
            "127.0.0.1",
            8080,
            "test",
        );
        assert_eq!(cfg.currency, "INR");
        assert_eq!(cfg.order_total_tolerance_minor, 0);
        assert_eq!(cfg.admin_role, "admin");
        assert!(!cfg.auto_migrate);
        assert_eq!(cfg.server_addr(), "127.0.0.1:8080");
    }
}
