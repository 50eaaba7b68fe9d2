//! # Domain Types
//!
//! Core domain types used throughout Resto POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Printer      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (unique)  │   │  receipt_number │   │  name (unique)  │       │
//! │  │  stock ×3 units │   │  FC + USD sums  │   │  is_default     │       │
//! │  │  price_*_fc     │   │  exchange_rate  │   │  paper_width    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Role       │   │   StockUnit     │   │  PaymentMode    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Admin          │   │  Casier         │   │  Fc             │       │
//! │  │  Caissier       │   │  Bouteille      │   │  Usd            │       │
//! │  │  Gestionnaire…  │   │  Verre          │   │  Mixte          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authoritative Currency
//! Every stored price is in francs. USD prices on products are computed from
//! the current rate; sales keep the USD figures and the rate they were
//! computed with.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::locale;
use crate::money::{ExchangeRate, Fc, Usd};
use crate::subscription::Plan;
use crate::typography::FontSize;

// =============================================================================
// Role
// =============================================================================

/// Dashboard user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Caissier,
    GestionnaireStock,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Caissier, Role::GestionnaireStock];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Caissier => "caissier",
            Role::GestionnaireStock => "gestionnaire_stock",
        }
    }

    /// French display name (`roles.<role>` in the auth table).
    pub fn label(&self) -> String {
        locale::translate(&format!("roles.{}", self.as_str()))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roles allowed to record sales.
    pub fn can_sell(&self) -> bool {
        matches!(self, Role::Admin | Role::Caissier)
    }

    /// Roles allowed to edit products and stock.
    pub fn can_manage_stock(&self) -> bool {
        matches!(self, Role::Admin | Role::GestionnaireStock)
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| crate::error::ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Stock Unit
// =============================================================================

/// The three granularities a beverage is stocked and sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockUnit {
    /// Crate of bottles.
    Casier,
    Bouteille,
    /// Glass poured from an opened bottle.
    Verre,
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Paid in francs.
    Fc,
    /// Paid in dollars.
    Usd,
    /// Part francs, part dollars.
    Mixte,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Fc
    }
}

// =============================================================================
// Connection Type
// =============================================================================

/// How a receipt printer is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Usb,
    Network,
    Bluetooth,
    /// Printer installed in the operating system's spooler.
    System,
}

impl Default for ConnectionType {
    fn default() -> Self {
        ConnectionType::System
    }
}

// =============================================================================
// Stock Levels
// =============================================================================

/// Stock held at each granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockLevels {
    pub crates: i64,
    pub bottles: i64,
    pub glasses: i64,
}

/// Unit counts linking the three granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Packaging {
    pub bottles_per_crate: i64,
    pub glasses_per_bottle: i64,
}

impl Packaging {
    /// How many glasses one `unit` holds.
    pub const fn glasses_in(&self, unit: StockUnit) -> i64 {
        match unit {
            StockUnit::Casier => self.bottles_per_crate * self.glasses_per_bottle,
            StockUnit::Bouteille => self.glasses_per_bottle,
            StockUnit::Verre => 1,
        }
    }
}

impl StockLevels {
    /// Total stock in glasses, the smallest unit.
    pub fn total_glasses(&self, packaging: Packaging) -> i64 {
        (self.crates * packaging.bottles_per_crate + self.bottles) * packaging.glasses_per_bottle
            + self.glasses
    }

    /// How many `unit`s can be taken out, opening larger units as needed.
    ///
    /// Crates are never reassembled from loose bottles.
    pub fn available_in(&self, unit: StockUnit, packaging: Packaging) -> i64 {
        match unit {
            StockUnit::Casier => self.crates,
            StockUnit::Bouteille => self.crates * packaging.bottles_per_crate + self.bottles,
            StockUnit::Verre => self.total_glasses(packaging),
        }
    }

    /// Removes `qty` of `unit`, breaking open crates and bottles when the
    /// loose stock of that unit runs out.
    ///
    /// ```rust
    /// use resto_core::types::{Packaging, StockLevels, StockUnit};
    ///
    /// let pack = Packaging { bottles_per_crate: 24, glasses_per_bottle: 4 };
    /// let stock = StockLevels { crates: 1, bottles: 0, glasses: 1 };
    /// let after = stock.take(StockUnit::Verre, 3, pack, "PRIMUS").unwrap();
    /// assert_eq!(after, StockLevels { crates: 0, bottles: 23, glasses: 2 });
    /// ```
    pub fn take(
        &self,
        unit: StockUnit,
        qty: i64,
        packaging: Packaging,
        code: &str,
    ) -> CoreResult<StockLevels> {
        let available = self.available_in(unit, packaging);
        if qty > available {
            return Err(CoreError::InsufficientStock {
                code: code.to_string(),
                available,
                requested: qty,
            });
        }

        let mut next = *self;
        match unit {
            StockUnit::Casier => next.crates -= qty,
            StockUnit::Bouteille => next.take_bottles(qty, packaging),
            StockUnit::Verre => {
                if next.glasses < qty {
                    let missing = qty - next.glasses;
                    let open = ceil_div(missing, packaging.glasses_per_bottle);
                    next.take_bottles(open, packaging);
                    next.glasses += open * packaging.glasses_per_bottle;
                }
                next.glasses -= qty;
            }
        }
        Ok(next)
    }

    fn take_bottles(&mut self, qty: i64, packaging: Packaging) {
        if self.bottles < qty {
            let missing = qty - self.bottles;
            let open = ceil_div(missing, packaging.bottles_per_crate);
            self.crates -= open;
            self.bottles += open * packaging.bottles_per_crate;
        }
        self.bottles -= qty;
    }
}

fn ceil_div(n: i64, d: i64) -> i64 {
    (n + d - 1) / d
}

// =============================================================================
// Product
// =============================================================================

/// A beverage or dish on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Business identifier, unique.
    pub code: String,
    pub category: String,
    /// Free-form unit label shown on the product sheet ("casier", "plat"...).
    pub unit_of_measure: String,
    pub bottles_per_crate: i64,
    pub glasses_per_bottle: i64,
    pub stock_crates: i64,
    pub stock_bottles: i64,
    pub stock_glasses: i64,
    /// Alert threshold, in bottles.
    pub min_stock: i64,
    pub price_crate_fc: i64,
    pub price_bottle_fc: i64,
    pub price_glass_fc: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A product's prices at every granularity in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPrices {
    pub crate_fc: Fc,
    pub bottle_fc: Fc,
    pub glass_fc: Fc,
    pub crate_usd: Usd,
    pub bottle_usd: Usd,
    pub glass_usd: Usd,
    pub exchange_rate: ExchangeRate,
}

impl Product {
    pub fn packaging(&self) -> Packaging {
        Packaging {
            bottles_per_crate: self.bottles_per_crate,
            glasses_per_bottle: self.glasses_per_bottle,
        }
    }

    pub fn stock(&self) -> StockLevels {
        StockLevels {
            crates: self.stock_crates,
            bottles: self.stock_bottles,
            glasses: self.stock_glasses,
        }
    }

    /// Price of one `unit` in francs.
    pub fn price_fc(&self, unit: StockUnit) -> Fc {
        Fc::new(match unit {
            StockUnit::Casier => self.price_crate_fc,
            StockUnit::Bouteille => self.price_bottle_fc,
            StockUnit::Verre => self.price_glass_fc,
        })
    }

    /// Price of one `unit` in dollars at `rate`.
    pub fn price_usd(&self, unit: StockUnit, rate: ExchangeRate) -> Usd {
        rate.to_usd(self.price_fc(unit))
    }

    pub fn prices(&self, rate: ExchangeRate) -> ProductPrices {
        ProductPrices {
            crate_fc: self.price_fc(StockUnit::Casier),
            bottle_fc: self.price_fc(StockUnit::Bouteille),
            glass_fc: self.price_fc(StockUnit::Verre),
            crate_usd: self.price_usd(StockUnit::Casier, rate),
            bottle_usd: self.price_usd(StockUnit::Bouteille, rate),
            glass_usd: self.price_usd(StockUnit::Verre, rate),
            exchange_rate: rate,
        }
    }

    /// Stock in bottle equivalents; partial bottles of poured glasses round down.
    pub fn total_bottles(&self) -> i64 {
        self.stock().total_glasses(self.packaging()) / self.glasses_per_bottle.max(1)
    }

    pub fn is_low_stock(&self) -> bool {
        self.total_bottles() <= self.min_stock
    }

    pub fn can_sell(&self, unit: StockUnit, qty: i64) -> bool {
        self.is_active && qty <= self.stock().available_in(unit, self.packaging())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// USD columns are a snapshot computed with `exchange_rate` when the sale was
/// recorded; they are never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub receipt_number: String,
    pub user_id: String,
    pub buyer_name: Option<String>,
    pub montant_total_fc: i64,
    pub montant_paye_fc: i64,
    pub rendu_fc: i64,
    /// Cents.
    pub montant_total_usd: i64,
    pub montant_paye_usd: i64,
    pub rendu_usd: i64,
    pub payment_mode: PaymentMode,
    pub exchange_rate: i64,
    pub is_printed: bool,
    pub is_synced: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Receipt number `YYYYMMDD-NNNN`, `seq` counting sales of that day.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use resto_core::types::Sale;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    /// assert_eq!(Sale::receipt_number_for(day, 7), "20260131-0007");
    /// ```
    pub fn receipt_number_for(date: NaiveDate, seq: i64) -> String {
        format!("{}-{:04}", date.format("%Y%m%d"), seq)
    }

    pub fn total_fc(&self) -> Fc {
        Fc::new(self.montant_total_fc)
    }

    pub fn total_usd(&self) -> Usd {
        Usd::from_cents(self.montant_total_usd)
    }

    pub fn rendu_fc(&self) -> Fc {
        Fc::new(self.rendu_fc)
    }

    pub fn rendu_usd(&self) -> Usd {
        Usd::from_cents(self.rendu_usd)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Name and price are frozen at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub name_snapshot: String,
    pub unit: StockUnit,
    pub quantity: i64,
    pub unit_price_fc: i64,
    pub line_total_fc: i64,
}

// =============================================================================
// Printer
// =============================================================================

/// A configured receipt printer and the establishment details printed on
/// its receipts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    pub id: String,
    pub name: String,
    pub connection_type: ConnectionType,
    /// Device path, host:port or OS printer name.
    pub connection: Option<String>,
    pub is_default: bool,
    /// Paper width in millimetres (58 or 80).
    pub paper_width: i64,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub restaurant_name: String,
    pub restaurant_address: Option<String>,
    pub restaurant_phone: Option<String>,
    pub restaurant_message: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Restaurant Settings
// =============================================================================

/// Install-wide settings (single row).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSettings {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<FontSize>,
    pub exchange_rate: i64,
    pub plan: Plan,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl RestaurantSettings {
    /// Stored rate, falling back to the default when the row holds a
    /// non-positive value.
    pub fn rate(&self) -> ExchangeRate {
        ExchangeRate::new(self.exchange_rate).unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
