//! # Sale Handlers
//!
//! ```text
//! POST /api/sales              admin, caissier
//! GET  /api/sales              any role (most recent first)
//! GET  /api/sales/:id          any role, with items
//! POST /api/sales/:id/printed  admin, caissier
//! ```
//!
//! The exchange rate always comes from the settings row; clients never
//! send one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::Pagination;
use crate::state::AppState;
use resto_core::pricing::{SaleLine, Tender};
use resto_core::{PaymentMode, Role, Sale, SaleItem};
use resto_db::NewSale;

const SELLER_ROLES: &[Role] = &[Role::Caissier];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub buyer_name: Option<String>,
    pub lines: Vec<SaleLine>,
    #[serde(default)]
    pub tender: Tender,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// `POST /api/sales`
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleWithItems>)> {
    current.require(SELLER_ROLES)?;

    let rate = state.db.settings().get().await?.rate();
    let new_sale = NewSale {
        user_id: current.0.id.clone(),
        buyer_name: body.buyer_name,
        lines: body.lines,
        tender: body.tender,
        payment_mode: body.payment_mode,
        exchange_rate: rate,
    };

    let (sale, items) = state.db.sales().record(&new_sale).await?;
    info!(
        receipt = %sale.receipt_number,
        total_fc = sale.montant_total_fc,
        rendu_fc = sale.rendu_fc,
        by = %current.0.email,
        "Sale recorded"
    );

    Ok((StatusCode::CREATED, Json(SaleWithItems { sale, items })))
}

/// `GET /api/sales`
pub async fn list(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Sale>>> {
    let (limit, offset) = page.clamped();
    Ok(Json(state.db.sales().list_recent(limit, offset).await?))
}

/// `GET /api/sales/:id`
pub async fn get(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithItems>> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;
    let items = state.db.sales().items(&id).await?;

    Ok(Json(SaleWithItems { sale, items }))
}

/// `POST /api/sales/:id/printed`
pub async fn mark_printed(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    current.require(SELLER_ROLES)?;
    state.db.sales().mark_printed(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
