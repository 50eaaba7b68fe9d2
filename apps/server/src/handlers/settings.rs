//! Restaurant settings and the server-side typography layer.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use resto_core::typography::TypographyLayer;
use resto_core::{Plan, RestaurantSettings};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub exchange_rate: i64,
    /// Unchanged when absent.
    #[serde(default)]
    pub plan: Option<Plan>,
}

/// `GET /api/settings`
pub async fn get(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<RestaurantSettings>> {
    current.require_admin()?;
    Ok(Json(state.db.settings().get().await?))
}

/// `PUT /api/settings`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<SettingsInput>,
) -> ApiResult<Json<RestaurantSettings>> {
    current.require_admin()?;

    let mut settings = state.db.settings().get().await?;
    settings.name = input.name;
    settings.address = input.address;
    settings.phone = input.phone;
    settings.exchange_rate = input.exchange_rate;
    if let Some(plan) = input.plan {
        settings.plan = plan;
    }

    let settings = state.db.settings().update(&settings).await?;
    info!(rate = settings.exchange_rate, by = %current.0.email, "Settings updated");

    Ok(Json(settings))
}

/// `GET /api/settings/typography`; readable by every role so each page
/// can apply it.
pub async fn typography(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> ApiResult<Json<TypographyLayer>> {
    Ok(Json(state.db.settings().typography().await?))
}

/// `PUT /api/settings/typography`
pub async fn update_typography(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(layer): Json<TypographyLayer>,
) -> ApiResult<Json<TypographyLayer>> {
    current.require_admin()?;
    Ok(Json(state.db.settings().update_typography(&layer).await?))
}
