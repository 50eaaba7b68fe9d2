//! # Repository Module
//!
//! One repository per table group. Each wraps a cloned `SqlitePool` and
//! is handed out by [`Database`](crate::Database).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler / CLI binary                                              │
//! │       │  db.sales().record(&new_sale)                                   │
//! │       ▼                                                                 │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐                     │
//! │  │ products     │ │ sales        │ │ printers     │                     │
//! │  │ search/stock │ │ record/list  │ │ upsert/dflt  │                     │
//! │  └──────────────┘ └──────────────┘ └──────────────┘                     │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐                     │
//! │  │ users        │ │ sessions     │ │ settings     │                     │
//! │  │ roles/active │ │ login tokens │ │ rate/plan/ty │                     │
//! │  └──────────────┘ └──────────────┘ └──────────────┘                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (migrations/sqlite)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod printer;
pub mod product;
pub mod sale;
pub mod session;
pub mod settings;
pub mod user;
