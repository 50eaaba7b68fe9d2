//! Receipt printer configuration. Admin only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use resto_core::Printer;
use resto_db::PrinterInput;

/// `GET /api/printers`
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<Printer>>> {
    current.require_admin()?;
    Ok(Json(state.db.printers().list().await?))
}

/// `POST /api/printers`; a printer with the same name is updated in place.
pub async fn upsert(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<PrinterInput>,
) -> ApiResult<Json<Printer>> {
    current.require_admin()?;
    input.validate()?;

    let printer = state.db.printers().upsert_by_name(&input).await?;
    info!(name = %printer.name, by = %current.0.email, "Printer saved");

    Ok(Json(printer))
}

/// `PUT /api/printers/:id`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<PrinterInput>,
) -> ApiResult<Json<Printer>> {
    current.require_admin()?;
    input.validate()?;

    Ok(Json(state.db.printers().update(&id, &input).await?))
}

/// `POST /api/printers/:id/default`
pub async fn set_default(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Printer>> {
    current.require_admin()?;
    Ok(Json(state.db.printers().set_default(&id).await?))
}

/// `DELETE /api/printers/:id`
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    current.require_admin()?;

    state.db.printers().delete(&id).await?;
    info!(id = %id, by = %current.0.email, "Printer deleted");

    Ok(StatusCode::NO_CONTENT)
}
