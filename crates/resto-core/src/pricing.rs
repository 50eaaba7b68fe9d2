//! # Pricing & Settlement
//!
//! Derived prices between granularities and the amounts recorded on a sale.
//!
//! ## Sale Flow
//! ```text
//! lines ──► price_lines ──► total_fc
//!                              │
//!          paid (FC / USD) ────┤
//!                              ▼
//!                           settle ──► Settlement
//!                                      total / paye / rendu
//!                                      in FC and USD (+ rate)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{div_round_half_away, saturate, ExchangeRate, Fc, Usd};
use crate::types::{PaymentMode, Product, Sale, StockUnit};
use crate::validation::{validate_quantity, validate_sale_size, validate_tender};

/// Basis points in 100%.
const BPS: i128 = 10_000;

// =============================================================================
// Derived Prices
// =============================================================================

/// Crate price from the bottle price: `bottle × bottles_per_crate × (1 − discount)`.
///
/// ```rust
/// use resto_core::money::Fc;
/// use resto_core::pricing::crate_price_from_bottle;
///
/// // 24 bottles at 2 500 FC with a 5% crate discount
/// assert_eq!(crate_price_from_bottle(Fc::new(2_500), 24, 500), Fc::new(57_000));
/// ```
pub fn crate_price_from_bottle(bottle: Fc, bottles_per_crate: i64, discount_bps: i64) -> Fc {
    let gross = bottle.francs() as i128 * bottles_per_crate as i128;
    Fc::new(saturate(div_round_half_away(gross * (BPS - discount_bps as i128), BPS)))
}

/// Glass price from the bottle price: `bottle / glasses_per_bottle × (1 + markup)`.
pub fn glass_price_from_bottle(bottle: Fc, glasses_per_bottle: i64, markup_bps: i64) -> Fc {
    let numerator = bottle.francs() as i128 * (BPS + markup_bps as i128);
    Fc::new(saturate(div_round_half_away(numerator, glasses_per_bottle.max(1) as i128 * BPS)))
}

/// Bottle equivalents of `qty` units of `product`.
///
/// A partly drunk bottle counts as a whole one, so glasses round up.
pub fn bottles_for(unit: StockUnit, qty: i64, product: &Product) -> i64 {
    let packaging = product.packaging();
    match unit {
        StockUnit::Casier => qty * packaging.bottles_per_crate,
        StockUnit::Bouteille => qty,
        StockUnit::Verre => {
            let per_bottle = packaging.glasses_per_bottle.max(1);
            (qty + per_bottle - 1).div_euclid(per_bottle)
        }
    }
}

// =============================================================================
// Sale Lines
// =============================================================================

/// A requested sale line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    pub unit: StockUnit,
    pub quantity: i64,
}

/// A line priced against its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub name: String,
    pub unit: StockUnit,
    pub quantity: i64,
    pub unit_price: Fc,
    pub line_total: Fc,
}

/// Prices every line with the product's current franc price.
///
/// `products` must hold the product of each line; lines are checked for
/// quantity and stock.
pub fn price_lines(lines: &[SaleLine], products: &[Product]) -> CoreResult<Vec<PricedLine>> {
    validate_sale_size(lines.len())?;

    lines
        .iter()
        .map(|line| {
            validate_quantity(line.quantity)?;
            let product = products
                .iter()
                .find(|p| p.id == line.product_id && p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let available = product.stock().available_in(line.unit, product.packaging());
            if line.quantity > available {
                return Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    available,
                    requested: line.quantity,
                });
            }

            let unit_price = product.price_fc(line.unit);
            Ok(PricedLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit: line.unit,
                quantity: line.quantity,
                unit_price,
                line_total: unit_price * line.quantity,
            })
        })
        .collect()
}

pub fn total_of(lines: &[PricedLine]) -> Fc {
    lines.iter().fold(Fc::zero(), |acc, l| acc + l.line_total)
}

// =============================================================================
// Settlement
// =============================================================================

/// What the customer handed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    #[serde(default)]
    pub paid_fc: Fc,
    #[serde(default)]
    pub paid_usd: Usd,
}

/// Amounts recorded on a sale.
///
/// ## Invariants
/// - `rendu = paye − total` in both currencies
/// - `total_usd = rate.to_usd(total_fc)`, `paye_usd = rate.to_usd(paye_fc)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub montant_total_fc: Fc,
    pub montant_paye_fc: Fc,
    pub rendu_fc: Fc,
    pub montant_total_usd: Usd,
    pub montant_paye_usd: Usd,
    pub rendu_usd: Usd,
    pub payment_mode: PaymentMode,
    pub exchange_rate: ExchangeRate,
}

impl Settlement {
    /// A sale paid to the franc with no change.
    pub fn exact(total: Fc, rate: ExchangeRate) -> Self {
        let total_usd = rate.to_usd(total);
        Settlement {
            montant_total_fc: total,
            montant_paye_fc: total,
            rendu_fc: Fc::zero(),
            montant_total_usd: total_usd,
            montant_paye_usd: total_usd,
            rendu_usd: Usd::zero(),
            payment_mode: PaymentMode::Fc,
            exchange_rate: rate,
        }
    }

    pub fn into_sale(
        self,
        id: String,
        receipt_number: String,
        user_id: String,
        buyer_name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Sale {
        Sale {
            id,
            receipt_number,
            user_id,
            buyer_name,
            montant_total_fc: self.montant_total_fc.francs(),
            montant_paye_fc: self.montant_paye_fc.francs(),
            rendu_fc: self.rendu_fc.francs(),
            montant_total_usd: self.montant_total_usd.cents(),
            montant_paye_usd: self.montant_paye_usd.cents(),
            rendu_usd: self.rendu_usd.cents(),
            payment_mode: self.payment_mode,
            exchange_rate: self.exchange_rate.francs_per_usd(),
            is_printed: false,
            is_synced: false,
            created_at,
        }
    }
}

/// Computes paid amount and change for a sale total.
///
/// The franc amount paid depends on the mode: `Fc` uses `paid_fc`, `Usd`
/// converts `paid_usd`, `Mixte` adds both. Change is always given from the
/// franc figures.
///
/// ```rust
/// use resto_core::money::{ExchangeRate, Fc, Usd};
/// use resto_core::pricing::{settle, Tender};
/// use resto_core::types::PaymentMode;
///
/// let tender = Tender { paid_fc: Fc::new(5_000), paid_usd: Usd::from_cents(500) };
/// let s = settle(Fc::new(15_000), tender, PaymentMode::Mixte, ExchangeRate::DEFAULT).unwrap();
/// assert_eq!(s.montant_paye_fc, Fc::new(17_500));
/// assert_eq!(s.rendu_fc, Fc::new(2_500));
/// assert_eq!(s.rendu_usd, Usd::from_cents(100));
/// ```
pub fn settle(
    total: Fc,
    tender: Tender,
    mode: PaymentMode,
    rate: ExchangeRate,
) -> CoreResult<Settlement> {
    if total.is_negative() {
        return Err(crate::error::ValidationError::Negative {
            field: "total".to_string(),
        }
        .into());
    }
    validate_tender(tender.paid_fc.francs(), tender.paid_usd.cents()).map_err(|e| {
        CoreError::InvalidPaymentAmount {
            reason: e.to_string(),
        }
    })?;

    let paye = match mode {
        PaymentMode::Fc => Some(tender.paid_fc),
        PaymentMode::Usd => rate.checked_to_fc(tender.paid_usd),
        PaymentMode::Mixte => rate
            .checked_to_fc(tender.paid_usd)
            .and_then(|usd_part| tender.paid_fc.checked_add(usd_part)),
    }
    .ok_or_else(|| CoreError::InvalidPaymentAmount {
        reason: "paid amount is too large".to_string(),
    })?;

    if paye < total {
        return Err(CoreError::InsufficientPayment { total, paid: paye });
    }

    let total_usd = rate.to_usd(total);
    let paye_usd = rate.to_usd(paye);

    Ok(Settlement {
        montant_total_fc: total,
        montant_paye_fc: paye,
        rendu_fc: paye - total,
        montant_total_usd: total_usd,
        montant_paye_usd: paye_usd,
        rendu_usd: paye_usd - total_usd,
        payment_mode: mode,
        exchange_rate: rate,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn product(id: &str) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: "Simba 65cl".to_string(),
            code: "SIMBA-65".to_string(),
            category: "Bières".to_string(),
            unit_of_measure: "casier".to_string(),
            bottles_per_crate: 12,
            glasses_per_bottle: 3,
            stock_crates: 1,
            stock_bottles: 2,
            stock_glasses: 0,
            min_stock: 6,
            price_crate_fc: 28_000,
            price_bottle_fc: 2_500,
            price_glass_fc: 1_000,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_crate_and_glass_derivation() {
        assert_eq!(crate_price_from_bottle(Fc::new(2_500), 12, 0), Fc::new(30_000));
        assert_eq!(glass_price_from_bottle(Fc::new(3_000), 3, 0), Fc::new(1_000));
        // 2 500 / 3 × 1.20 = 1 000
        assert_eq!(glass_price_from_bottle(Fc::new(2_500), 3, 2_000), Fc::new(1_000));
    }

    #[test]
    fn test_bottles_for() {
        let simba = product("p1");
        assert_eq!(bottles_for(StockUnit::Casier, 2, &simba), 24);
        assert_eq!(bottles_for(StockUnit::Bouteille, 5, &simba), 5);
        assert_eq!(bottles_for(StockUnit::Verre, 3, &simba), 1);
        assert_eq!(bottles_for(StockUnit::Verre, 4, &simba), 2);
        assert_eq!(bottles_for(StockUnit::Verre, 0, &simba), 0);
    }

    #[test]
    fn test_price_lines_totals() {
        let products = vec![product("p1")];
        let lines = vec![
            SaleLine { product_id: "p1".into(), unit: StockUnit::Bouteille, quantity: 3 },
            SaleLine { product_id: "p1".into(), unit: StockUnit::Verre, quantity: 2 },
        ];
        let priced = price_lines(&lines, &products).unwrap();
        assert_eq!(priced[0].line_total, Fc::new(7_500));
        assert_eq!(priced[1].line_total, Fc::new(2_000));
        assert_eq!(total_of(&priced), Fc::new(9_500));
    }

    #[test]
    fn test_price_lines_rejects_unknown_and_oversell() {
        let products = vec![product("p1")];
        let unknown = vec![SaleLine { product_id: "nope".into(), unit: StockUnit::Verre, quantity: 1 }];
        assert!(matches!(
            price_lines(&unknown, &products),
            Err(CoreError::ProductNotFound(_))
        ));

        let too_many = vec![SaleLine { product_id: "p1".into(), unit: StockUnit::Casier, quantity: 2 }];
        assert!(matches!(
            price_lines(&too_many, &products),
            Err(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        assert!(price_lines(&[], &products).is_err());
    }

    #[test]
    fn test_settle_fc_exact_change() {
        let s = settle(
            Fc::new(12_500),
            Tender { paid_fc: Fc::new(20_000), paid_usd: Usd::zero() },
            PaymentMode::Fc,
            ExchangeRate::DEFAULT,
        )
        .unwrap();
        assert_eq!(s.rendu_fc, Fc::new(7_500));
        assert_eq!(s.montant_total_usd, Usd::from_cents(500));
        assert_eq!(s.montant_paye_usd, Usd::from_cents(800));
        assert_eq!(s.rendu_usd, Usd::from_cents(300));
    }

    #[test]
    fn test_settle_usd_only() {
        let s = settle(
            Fc::new(12_500),
            Tender { paid_fc: Fc::new(99_999), paid_usd: Usd::from_cents(1_000) },
            PaymentMode::Usd,
            ExchangeRate::DEFAULT,
        )
        .unwrap();
        // the FC field is ignored in USD mode
        assert_eq!(s.montant_paye_fc, Fc::new(25_000));
        assert_eq!(s.rendu_fc, Fc::new(12_500));
    }

    #[test]
    fn test_settle_rejects_underpayment() {
        let err = settle(
            Fc::new(12_500),
            Tender { paid_fc: Fc::new(10_000), paid_usd: Usd::zero() },
            PaymentMode::Fc,
            ExchangeRate::DEFAULT,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPayment { .. }));
    }

    #[test]
    fn test_settle_rejects_oversized_tender() {
        let rate = ExchangeRate::DEFAULT;
        let usd_only = settle(
            Fc::new(1_000),
            Tender { paid_fc: Fc::zero(), paid_usd: Usd::from_cents(i64::MAX / 10) },
            PaymentMode::Usd,
            rate,
        )
        .unwrap_err();
        assert!(matches!(usd_only, CoreError::InvalidPaymentAmount { .. }));

        let mixed = settle(
            Fc::new(1_000),
            Tender { paid_fc: Fc::new(i64::MAX), paid_usd: Usd::from_cents(100) },
            PaymentMode::Mixte,
            rate,
        )
        .unwrap_err();
        assert!(matches!(mixed, CoreError::InvalidPaymentAmount { .. }));

        let huge_rate = ExchangeRate::new(i64::MAX).unwrap();
        let converted = settle(
            Fc::new(1_000),
            Tender { paid_fc: Fc::zero(), paid_usd: Usd::from_cents(1_000) },
            PaymentMode::Usd,
            huge_rate,
        )
        .unwrap_err();
        assert!(matches!(converted, CoreError::InvalidPaymentAmount { .. }));
    }

    #[test]
    fn test_settle_accepts_largest_tender() {
        let s = settle(
            Fc::new(1_000),
            Tender {
                paid_fc: Fc::new(crate::MAX_TENDER_FC),
                paid_usd: Usd::from_cents(crate::MAX_TENDER_USD_CENTS),
            },
            PaymentMode::Mixte,
            ExchangeRate::DEFAULT,
        )
        .unwrap();
        assert_eq!(s.rendu_fc, s.montant_paye_fc - s.montant_total_fc);
    }

    proptest! {
        #[test]
        fn settlement_invariants(total in 0i64..5_000_000, extra in 0i64..5_000_000) {
            let rate = ExchangeRate::DEFAULT;
            let tender = Tender { paid_fc: Fc::new(total + extra), paid_usd: Usd::zero() };
            let s = settle(Fc::new(total), tender, PaymentMode::Fc, rate).unwrap();
            prop_assert_eq!(s.rendu_fc, s.montant_paye_fc - s.montant_total_fc);
            prop_assert_eq!(s.rendu_usd, s.montant_paye_usd - s.montant_total_usd);
            prop_assert_eq!(s.montant_total_usd, rate.to_usd(s.montant_total_fc));
            prop_assert_eq!(s.montant_paye_usd, rate.to_usd(s.montant_paye_fc));
        }
    }
}
