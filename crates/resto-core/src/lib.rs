//! # resto-core: Pure Business Logic for Resto POS
//!
//! Everything the restaurant point of sale decides without touching a disk or
//! a socket: prices in francs and dollars, change due, stock arithmetic across
//! crates, bottles and glasses, who sees which menu entry.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Resto POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (React)                            │   │
//! │  │    Ventes ──► Produits ──► Stock ──► Imprimantes ──► Paramètres │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP (session cookie)        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   money · types · pricing · navigation · typography            │   │
//! │  │   locale · subscription · factory · validation                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    resto-db (SQLite)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Fc`, `Usd` and the `ExchangeRate` between them
//! - [`types`] - Domain records (Product, Sale, Printer, User...)
//! - [`pricing`] - Derived prices, sale lines, settlement (paid / change)
//! - [`navigation`] - Sidebar entries and role filtering
//! - [`typography`] - Font preference resolution
//! - [`locale`] - French authentication strings
//! - [`subscription`] - Plan limits
//! - [`factory`] - Random records for seeding and tests
//! - [`validation`] - Field rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use resto_core::money::{ExchangeRate, Fc, Usd};
//! use resto_core::pricing::{settle, Tender};
//! use resto_core::types::PaymentMode;
//!
//! let tender = Tender { paid_fc: Fc::new(20_000), paid_usd: Usd::zero() };
//! let s = settle(Fc::new(12_500), tender, PaymentMode::Fc, ExchangeRate::DEFAULT).unwrap();
//!
//! assert_eq!(s.rendu_fc, Fc::new(7_500));
//! assert_eq!(s.montant_total_usd.to_string(), "$5.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod factory;
pub mod locale;
pub mod money;
pub mod navigation;
pub mod pricing;
pub mod subscription;
pub mod types;
pub mod typography;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{ExchangeRate, Fc, Usd};
pub use subscription::Plan;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines on a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity on a single sale line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Highest unit price a product may carry, in francs.
pub const MAX_PRICE_FC: i64 = 100_000_000;

/// Highest franc amount accepted as payment on one sale.
pub const MAX_TENDER_FC: i64 = 1_000_000_000_000;

/// Highest dollar amount accepted as payment on one sale, in cents.
pub const MAX_TENDER_USD_CENTS: i64 = 100_000_000_000;
