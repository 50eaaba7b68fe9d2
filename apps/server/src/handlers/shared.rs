//! Data every dashboard page receives.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::auth::{CurrentUser, SessionUser};
use crate::error::ApiResult;
use crate::state::AppState;
use resto_core::navigation::{default_navigation, visible_items, NavItem};
use resto_core::typography::{self, Typography, TypographyLayer};
use resto_core::Plan;

/// Typography as stored on the server plus the value it resolves to
/// before any browser-cached preference is applied.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub typography: TypographyLayer,
    pub resolved: Typography,
    /// Key the browser caches its own preference under.
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInfo {
    pub name: String,
    pub plan: Plan,
    pub exchange_rate: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SharedData {
    pub user: SessionUser,
    pub customization: Customization,
    pub navigation: Vec<NavItem>,
    pub restaurant: RestaurantInfo,
}

/// `GET /api/shared`
pub async fn shared(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<SharedData>> {
    let settings = state.db.settings().get().await?;
    let layer = state.db.settings().typography().await?;

    let resolved = typography::resolve(Some(&layer), None);
    let navigation = visible_items(current.role(), &default_navigation());

    Ok(Json(SharedData {
        user: SessionUser::from(&current.0),
        customization: Customization {
            typography: layer,
            resolved,
            storage_key: typography::STORAGE_KEY.to_string(),
        },
        navigation,
        restaurant: RestaurantInfo {
            name: settings.name.clone(),
            plan: settings.plan,
            exchange_rate: settings.rate().francs_per_usd(),
        },
    }))
}
