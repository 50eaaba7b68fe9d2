//! # State Module
//!
//! Shared state handed to every axum handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AppState (Clone, cheap)                              │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │  Database    │  │  Arc<AppConfig>  │  │  LoginThrottle           │  │
//! │  │  (SqlitePool)│  │  read-only       │  │  moka::sync::Cache (TTL) │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: the pool hands out connections                            │
//! │  • AppConfig: never mutated after startup                              │
//! │  • LoginThrottle: per-key atomic upserts, bounded entry count          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod throttle;

use std::sync::Arc;
use std::time::Duration;

pub use config::{
    AppConfig, CurrencyConfig, DatabaseConfig, ServerConfig, SessionConfig, ThrottleConfig,
};
pub use throttle::LoginThrottle;

use resto_db::Database;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub throttle: LoginThrottle,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let throttle = LoginThrottle::new(
            config.throttle.max_attempts,
            Duration::from_secs(config.throttle.decay_seconds),
        );

        AppState {
            db,
            config: Arc::new(config),
            throttle,
        }
    }
}
