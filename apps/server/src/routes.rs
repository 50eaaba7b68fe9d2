//! Route table.
//!
//! ```text
//! /health, /login, /logout         public
//! /api/*                           session required (require_session)
//! everything else                  dashboard assets, index.html fallback
//! ```

use std::path::Path;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::{self, require_session};
use crate::handlers::{dashboard, health, printers, products, sales, settings, shared, users};
use crate::state::AppState;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/shared", get(shared::shared))
        .route("/dashboard", get(dashboard::dashboard))
        .nest("/products", product_routes())
        .nest("/sales", sale_routes())
        .nest("/printers", printer_routes())
        .nest("/users", user_routes())
        .nest("/settings", settings_routes())
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/low-stock", get(products::low_stock))
        .route(
            "/:id",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/:id/stock", post(products::adjust_stock))
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sales::list).post(sales::create))
        .route("/:id", get(sales::get))
        .route("/:id/printed", post(sales::mark_printed))
}

fn printer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(printers::list).post(printers::upsert))
        .route("/:id", put(printers::update).delete(printers::delete))
        .route("/:id/default", post(printers::set_default))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/:id/role", put(users::change_role))
        .route("/:id/password", put(users::reset_password))
        .route("/:id/deactivate", post(users::deactivate))
        .route("/:id/activate", post(users::activate))
}

fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::get).put(settings::update))
        .route(
            "/typography",
            get(settings::typography).put(settings::update_typography),
        )
}

/// Public routes, the protected API and the asset fallback.
pub fn routes(state: AppState) -> Router<AppState> {
    let assets = Path::new(&state.config.server.assets_dir);
    let spa = ServeDir::new(assets).not_found_service(ServeFile::new(assets.join("index.html")));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .nest("/api", api_routes(state.clone()))
        .fallback_service(spa)
}
