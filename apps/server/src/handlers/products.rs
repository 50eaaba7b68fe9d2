//! # Product Handlers
//!
//! ```text
//! GET    /api/products?q=&limit=&offset=   any role
//! GET    /api/products/low-stock           any role
//! GET    /api/products/:id                 any role
//! POST   /api/products                     admin, gestionnaire_stock (plan limit)
//! PUT    /api/products/:id                 admin, gestionnaire_stock
//! POST   /api/products/:id/stock           admin, gestionnaire_stock
//! DELETE /api/products/:id                 admin, gestionnaire_stock (soft)
//! ```
//!
//! Every product is returned with its prices in both currencies at the
//! current settings rate.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use resto_core::subscription::check_product_limit;
use resto_core::validation::{
    validate_category, validate_code, validate_packaging, validate_price_fc,
    validate_product_name, validate_search_query, validate_stock,
};
use resto_core::{ExchangeRate, Product, ProductPrices, Role, StockLevels, ValidationError};

const STOCK_ROLES: &[Role] = &[Role::GestionnaireStock];

/// A product with derived prices and stock state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(flatten)]
    pub product: Product,
    pub prices: ProductPrices,
    pub total_bottles: i64,
    pub low_stock: bool,
}

impl ProductDto {
    pub fn new(product: Product, rate: ExchangeRate) -> Self {
        ProductDto {
            prices: product.prices(rate),
            total_bottles: product.total_bottles(),
            low_stock: product.is_low_stock(),
            product,
        }
    }
}

/// Fields accepted on create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub code: String,
    pub category: String,
    #[serde(default = "default_unit_of_measure")]
    pub unit_of_measure: String,
    #[serde(default = "one")]
    pub bottles_per_crate: i64,
    #[serde(default = "one")]
    pub glasses_per_bottle: i64,
    /// Initial stock; ignored on update.
    #[serde(default)]
    pub stock: StockLevels,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub price_crate_fc: i64,
    pub price_bottle_fc: i64,
    #[serde(default)]
    pub price_glass_fc: i64,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn default_unit_of_measure() -> String {
    "bouteille".to_string()
}

fn one() -> i64 {
    1
}

fn active() -> bool {
    true
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name(&self.name)?;
        validate_code(&self.code)?;
        validate_category(&self.category)?;
        validate_packaging(self.bottles_per_crate, self.glasses_per_bottle)?;
        validate_stock("stock_crates", self.stock.crates)?;
        validate_stock("stock_bottles", self.stock.bottles)?;
        validate_stock("stock_glasses", self.stock.glasses)?;
        validate_stock("min_stock", self.min_stock)?;
        validate_price_fc("price_crate_fc", self.price_crate_fc)?;
        validate_price_fc("price_bottle_fc", self.price_bottle_fc)?;
        validate_price_fc("price_glass_fc", self.price_glass_fc)?;
        Ok(())
    }

    /// Copies the editable fields onto `product`.
    fn apply(self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.code = self.code.trim().to_uppercase();
        product.category = self.category.trim().to_string();
        product.unit_of_measure = self.unit_of_measure.trim().to_string();
        product.bottles_per_crate = self.bottles_per_crate;
        product.glasses_per_bottle = self.glasses_per_bottle;
        product.min_stock = self.min_stock;
        product.price_crate_fc = self.price_crate_fc;
        product.price_bottle_fc = self.price_bottle_fc;
        product.price_glass_fc = self.price_glass_fc;
        product.is_active = self.is_active;
    }

    fn into_product(self) -> Product {
        let now = Utc::now();
        let stock = self.stock;
        let mut product = Product {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            code: String::new(),
            category: String::new(),
            unit_of_measure: String::new(),
            bottles_per_crate: 1,
            glasses_per_bottle: 1,
            stock_crates: stock.crates,
            stock_bottles: stock.bottles,
            stock_glasses: stock.glasses,
            min_stock: 0,
            price_crate_fc: 0,
            price_bottle_fc: 0,
            price_glass_fc: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.apply(&mut product);
        product
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

async fn current_rate(state: &AppState) -> ApiResult<ExchangeRate> {
    Ok(state.db.settings().get().await?.rate())
}

async fn load(state: &AppState, id: &str) -> ApiResult<Product> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let limit = query.limit.clamp(1, 200);
    let search = validate_search_query(query.q.as_deref().unwrap_or(""))?;

    let products = if search.is_empty() {
        state.db.products().list(limit, query.offset.max(0)).await?
    } else {
        state.db.products().search(&search, limit).await?
    };

    let rate = current_rate(&state).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductDto::new(p, rate))
            .collect(),
    ))
}

/// `GET /api/products/low-stock`
pub async fn low_stock(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let products = state.db.products().low_stock().await?;
    let rate = current_rate(&state).await?;

    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductDto::new(p, rate))
            .collect(),
    ))
}

/// `GET /api/products/:id`
pub async fn get(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    let product = load(&state, &id).await?;
    let rate = current_rate(&state).await?;
    Ok(Json(ProductDto::new(product, rate)))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<ProductDto>)> {
    current.require(STOCK_ROLES)?;
    input.validate()?;

    let settings = state.db.settings().get().await?;
    let count = state.db.products().count().await?;
    check_product_limit(settings.plan, count)?;

    let product = state.db.products().insert(&input.into_product()).await?;
    info!(code = %product.code, by = %current.0.email, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductDto::new(product, settings.rate())),
    ))
}

/// `PUT /api/products/:id`
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<ProductDto>> {
    current.require(STOCK_ROLES)?;
    input.validate()?;

    let mut product = load(&state, &id).await?;
    if !product.is_active && input.is_active {
        let plan = state.db.settings().get().await?.plan;
        check_product_limit(plan, state.db.products().count().await?)?;
    }
    input.apply(&mut product);

    let product = state.db.products().update(&product).await?;
    info!(code = %product.code, by = %current.0.email, "Product updated");

    let rate = current_rate(&state).await?;
    Ok(Json(ProductDto::new(product, rate)))
}

/// `POST /api/products/:id/stock` with a signed delta per unit.
pub async fn adjust_stock(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(delta): Json<StockLevels>,
) -> ApiResult<Json<ProductDto>> {
    current.require(STOCK_ROLES)?;

    let product = state.db.products().adjust_stock(&id, delta).await?;
    info!(
        code = %product.code,
        crates = delta.crates,
        bottles = delta.bottles,
        glasses = delta.glasses,
        by = %current.0.email,
        "Stock adjusted"
    );

    let rate = current_rate(&state).await?;
    Ok(Json(ProductDto::new(product, rate)))
}

/// `DELETE /api/products/:id`
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    current.require(STOCK_ROLES)?;

    state.db.products().soft_delete(&id).await?;
    info!(id = %id, by = %current.0.email, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": "Primus 72cl",
            "code": "primus-72",
            "category": "Bières",
            "bottlesPerCrate": 12,
            "glassesPerBottle": 3,
            "stock": { "crates": 2, "bottles": 5, "glasses": 0 },
            "priceBottleFc": 2500,
            "priceCrateFc": 28000
        }))
        .unwrap()
    }

    #[test]
    fn test_input_defaults_and_normalization() {
        let product = input().into_product();

        assert_eq!(product.code, "PRIMUS-72");
        assert_eq!(product.unit_of_measure, "bouteille");
        assert_eq!(product.stock_crates, 2);
        assert_eq!(product.price_glass_fc, 0);
        assert!(product.is_active);
    }

    #[test]
    fn test_input_validation() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.glasses_per_bottle = 0;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.price_bottle_fc = -1;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_dto_carries_usd_prices() {
        let dto = ProductDto::new(input().into_product(), ExchangeRate::DEFAULT);
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["code"], "PRIMUS-72");
        assert_eq!(json["bottlesPerCrate"], 12);
        assert_eq!(json["prices"]["bottleFc"], 2500);
        assert_eq!(json["totalBottles"], 29);
        assert_eq!(json["lowStock"], false);
    }
}
