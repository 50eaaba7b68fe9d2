//! # Resto Server Library
//!
//! HTTP backend of the restaurant dashboard.
//!
//! ## Module Organization
//! ```text
//! resto_server/
//! ├── lib.rs          ◄─── You are here (router + tracing setup)
//! ├── main.rs         ◄─── Config, database, serve
//! ├── auth.rs         ◄─── Login/logout, session middleware, role guard
//! ├── routes.rs       ◄─── Route table
//! ├── handlers/       ◄─── One module per resource
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── config.rs   ◄─── Layered configuration
//! │   └── throttle.rs ◄─── Failed-login throttle
//! └── error.rs        ◄─── ApiError → JSON response
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TraceLayer ──► CorsLayer ──► Router                                    │
//! │                                 │                                       │
//! │          ┌──────────────────────┼────────────────────────┐              │
//! │          ▼                      ▼                        ▼              │
//! │   /login /logout /health   /api/* (require_session)   assets fallback   │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                        handler(CurrentUser) ──► resto-db ──► SQLite     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use state::{AppConfig, AppState};

const DEFAULT_LOG_FILTER: &str = "info,resto=debug,sqlx=warn";

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::routes(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Installs the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();
}
