//! # HTTP Handlers
//!
//! One module per resource. Handlers stay thin: check the role, call the
//! repository, shape the JSON.
//!
//! ```text
//! handlers/
//! ├── shared.rs     GET /api/shared (user, typography, navigation)
//! ├── dashboard.rs  GET /api/dashboard
//! ├── products.rs   catalogue + stock
//! ├── sales.rs      checkout, history, printed flag
//! ├── printers.rs   receipt printer configuration
//! ├── users.rs      accounts and roles
//! ├── settings.rs   restaurant settings + typography
//! └── health.rs     GET /health
//! ```

pub mod dashboard;
pub mod health;
pub mod printers;
pub mod products;
pub mod sales;
pub mod settings;
pub mod shared;
pub mod users;

use serde::Deserialize;

/// `?limit=&offset=` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Pagination {
    /// Limit clamped to 1..=200, offset to >= 0.
    pub fn clamped(self) -> (i64, i64) {
        (self.limit.clamp(1, 200), self.offset.max(0))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            limit: default_limit(),
            offset: 0,
        }
    }
}
