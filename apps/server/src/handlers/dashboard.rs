use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use resto_core::{Product, Sale};
use resto_db::DailySummary;

const RECENT_SALES: i64 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub today: DailySummary,
    pub low_stock: Vec<Product>,
    pub recent_sales: Vec<Sale>,
}

/// `GET /api/dashboard`: today's totals, products to restock and the
/// latest sales.
pub async fn dashboard(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> ApiResult<Json<DashboardData>> {
    let today = state
        .db
        .sales()
        .daily_summary(Utc::now().date_naive())
        .await?;
    let low_stock = state.db.products().low_stock().await?;
    let recent_sales = state.db.sales().list_recent(RECENT_SALES, 0).await?;

    Ok(Json(DashboardData {
        today,
        low_stock,
        recent_sales,
    }))
}
