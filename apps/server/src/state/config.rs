//! # Server Configuration
//!
//! Loaded once at startup; read-only afterwards.
//!
//! ## Sources (lowest to highest priority)
//! 1. Defaults (this file)
//! 2. `config/<RESTO_ENV>.toml` (optional, `RESTO_ENV` defaults to
//!    `development`)
//! 3. Environment variables `RESTO__<SECTION>__<KEY>`, e.g.
//!    `RESTO__SERVER__PORT=8080`

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub throttle: ThrottleConfig,
    pub currency: CurrencyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Built dashboard assets, served for every non-API path.
    pub assets_dir: String,
    /// Take the client address from `X-Forwarded-For`. Enable only behind a
    /// reverse proxy that overwrites the header.
    pub trust_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; `:memory:` for a throwaway database.
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Idle lifetime; every authenticated request extends it.
    pub lifetime_minutes: i64,
    /// Adds the `Secure` attribute to the cookie (HTTPS deployments).
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Failed logins allowed per email and IP before lockout.
    pub max_attempts: u32,
    /// Lockout length, counted from the first failure.
    pub decay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Francs per dollar used when the settings row has none.
    pub exchange_rate: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RESTO_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("RESTO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Defaults only; used by tests.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder("test")?.build()?.try_deserialize()
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.assets_dir", "public")?
            .set_default("server.trust_proxy", false)?
            .set_default("database.path", "resto.db")?
            .set_default("database.max_connections", 5)?
            .set_default("session.cookie_name", "resto_session")?
            .set_default("session.lifetime_minutes", 120)?
            .set_default("session.secure_cookie", false)?
            .set_default("throttle.max_attempts", 5)?
            .set_default("throttle.decay_seconds", 60)?
            .set_default("currency.exchange_rate", 2500)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session.lifetime_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::defaults().unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.session.cookie_name, "resto_session");
        assert_eq!(config.session_lifetime(), chrono::Duration::hours(2));
        assert!(!config.server.trust_proxy);
        assert_eq!(config.throttle.max_attempts, 5);
        assert_eq!(config.currency.exchange_rate, 2500);
    }
}
