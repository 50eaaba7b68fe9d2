use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;
use resto_db::migrations::migration_status;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    /// `[embedded, applied]`
    pub migrations: Option<(usize, usize)>,
}

/// `GET /health`; 503 when the database does not answer.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if !state.db.health_check().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                version: env!("CARGO_PKG_VERSION"),
                database: "disconnected",
                migrations: None,
            }),
        );
    }

    let migrations = migration_status(state.db.pool()).await.ok();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            database: "connected",
            migrations,
        }),
    )
}
