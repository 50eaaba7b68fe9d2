//! # Settings Repository
//!
//! The single `restaurant_settings` row: establishment identity, exchange
//! rate, subscription plan and the server-side typography layer.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use resto_core::typography::TypographyLayer;
use resto_core::validation::{validate_restaurant_name, ValidationResult};
use resto_core::{ExchangeRate, Plan, RestaurantSettings, ValidationError};

const SETTINGS_COLUMNS: &str =
    "name, address, phone, font_family, font_size, exchange_rate, plan, updated_at";

/// Name given to a fresh install.
pub const DEFAULT_RESTAURANT_NAME: &str = "Mon Restaurant";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

fn validate(settings: &RestaurantSettings) -> ValidationResult<()> {
    validate_restaurant_name(&settings.name)?;
    if settings.exchange_rate <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "exchange_rate".to_string(),
        });
    }
    Ok(())
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Creates the settings row with `rate` if the install has none yet.
    pub async fn init(&self, rate: ExchangeRate) -> DbResult<RestaurantSettings> {
        let created = sqlx::query(
            r#"
            INSERT OR IGNORE INTO restaurant_settings (id, name, exchange_rate, plan, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            "#,
        )
        .bind(DEFAULT_RESTAURANT_NAME)
        .bind(rate.francs_per_usd())
        .bind(Plan::Gratuit)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if created > 0 {
            info!(rate = rate.francs_per_usd(), "Restaurant settings initialized");
        }

        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM restaurant_settings WHERE id = 1");

        Ok(sqlx::query_as::<_, RestaurantSettings>(&sql)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Current settings, creating the default row on first access.
    pub async fn get(&self) -> DbResult<RestaurantSettings> {
        self.init(ExchangeRate::DEFAULT).await
    }

    pub async fn update(&self, settings: &RestaurantSettings) -> DbResult<RestaurantSettings> {
        validate(settings).map_err(resto_core::CoreError::from)?;
        self.get().await?;

        info!(
            name = %settings.name,
            rate = settings.exchange_rate,
            plan = %settings.plan,
            "Updating restaurant settings"
        );

        sqlx::query(
            r#"
            UPDATE restaurant_settings SET
                name = ?1, address = ?2, phone = ?3, font_family = ?4, font_size = ?5,
                exchange_rate = ?6, plan = ?7, updated_at = ?8
            WHERE id = 1
            "#,
        )
        .bind(settings.name.trim())
        .bind(&settings.address)
        .bind(&settings.phone)
        .bind(&settings.font_family)
        .bind(settings.font_size)
        .bind(settings.exchange_rate)
        .bind(settings.plan)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get().await
    }

    /// The stored typography layer; unset fields stay `None`.
    pub async fn typography(&self) -> DbResult<TypographyLayer> {
        let settings = self.get().await?;
        Ok(TypographyLayer {
            font_family: settings.font_family,
            font_size: settings.font_size,
        })
    }

    /// Replaces the server-side typography layer.
    pub async fn update_typography(&self, layer: &TypographyLayer) -> DbResult<TypographyLayer> {
        self.get().await?;
        debug!(family = ?layer.font_family, size = ?layer.font_size, "Saving typography");

        let family = layer
            .font_family
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());

        sqlx::query(
            "UPDATE restaurant_settings SET font_family = ?1, font_size = ?2, updated_at = ?3 WHERE id = 1",
        )
        .bind(family)
        .bind(layer.font_size)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.typography().await
    }
}
