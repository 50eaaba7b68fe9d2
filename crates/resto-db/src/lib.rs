//! # resto-db: Database Layer for Resto POS
//!
//! SQLite storage for the restaurant point of sale, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Resto POS Data Flow                              │
//! │                                                                         │
//! │  resto-server handler      seed / configure-printer binaries           │
//! │       │                           │                                     │
//! │       ▼                           ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     resto-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ products      │    │  (embedded)  │  │   │
//! │  │   │   SqlitePool  │    │ sales         │    │ 001_init.sql │  │   │
//! │  │   │               │    │ printers ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resto.db (WAL, foreign keys on)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("resto.db")).await?;
//! let beers = db.products().search("primus", 20).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::printer::{PrinterInput, PrinterRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::{DailySummary, NewSale, SaleRepository};
pub use repository::session::{Session, SessionRepository};
pub use repository::settings::SettingsRepository;
pub use repository::user::UserRepository;
