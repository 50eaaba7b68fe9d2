//! # Validation Module
//!
//! Input validation for Resto POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard (TypeScript)                                       │
//! │  └── Immediate feedback on forms                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (product code, printer name, user email)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use resto_core::validation::{validate_code, validate_quantity};
//!
//! validate_code("PRIMUS-72").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{
    MAX_ITEM_QUANTITY, MAX_PRICE_FC, MAX_SALE_ITEMS, MAX_TENDER_FC, MAX_TENDER_USD_CENTS,
    MIN_PASSWORD_LENGTH,
};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Paper widths supported by thermal receipt printers, in millimetres.
pub const PAPER_WIDTHS: [i64; 2] = [58, 80];

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use resto_core::validation::validate_code;
///
/// assert!(validate_code("PRIMUS-72").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    required("code", code, 50)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name, 200)
}

pub fn validate_category(category: &str) -> ValidationResult<()> {
    required("category", category, 100)
}

/// Validates a printer name (unique key of the printers table).
pub fn validate_printer_name(name: &str) -> ValidationResult<()> {
    required("name", name, 120)
}

/// Establishment name printed on receipts.
pub fn validate_restaurant_name(name: &str) -> ValidationResult<()> {
    required("restaurant_name", name, 120)
}

/// Validates a person's display name.
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    required("name", name, 120)
}

/// Returns the trimmed query; empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Loose email check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email, 254)?;

    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity: 1 to `MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in francs: 0 (offered items) to `MAX_PRICE_FC`.
pub fn validate_price_fc(field: &str, francs: i64) -> ValidationResult<()> {
    within(field, francs, MAX_PRICE_FC)
}

/// Validates the amounts handed over for a sale, francs and US cents.
pub fn validate_tender(paid_fc: i64, paid_usd_cents: i64) -> ValidationResult<()> {
    within("paid_fc", paid_fc, MAX_TENDER_FC)?;
    within("paid_usd", paid_usd_cents, MAX_TENDER_USD_CENTS)
}

fn within(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

/// Stock counts may be zero but never negative.
pub fn validate_stock(field: &str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Units per crate and glasses per bottle must be at least one.
pub fn validate_packaging(bottles_per_crate: i64, glasses_per_bottle: i64) -> ValidationResult<()> {
    if bottles_per_crate <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "bottles_per_crate".to_string(),
        });
    }

    if glasses_per_bottle <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "glasses_per_bottle".to_string(),
        });
    }

    Ok(())
}

pub fn validate_paper_width(width: i64) -> ValidationResult<()> {
    if !PAPER_WIDTHS.contains(&width) {
        return Err(ValidationError::NotAllowed {
            field: "paper_width".to_string(),
            allowed: PAPER_WIDTHS.iter().map(|w| w.to_string()).collect(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// A sale holds 1 to `MAX_SALE_ITEMS` lines.
pub fn validate_sale_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 || lines > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("PRIMUS-72").is_ok());
        assert!(validate_code("fanta_33").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Primus 72cl").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"é".repeat(200)).is_ok());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@resto.cd").is_ok());
        assert!(validate_email("  caisse@resto.cd ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("admin").is_err());
        assert!(validate_email("@resto.cd").is_err());
        assert!(validate_email("admin@resto").is_err());
        assert!(validate_email("a@b@resto.cd").is_err());
        assert!(validate_email("ad min@resto.cd").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("motdepasse").is_ok());
        assert!(validate_password("court").is_err());
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_price_fc("price_bottle_fc", 0).is_ok());
        assert!(validate_price_fc("price_bottle_fc", MAX_PRICE_FC).is_ok());
        assert!(validate_price_fc("price_bottle_fc", MAX_PRICE_FC + 1).is_err());
        assert!(validate_price_fc("price_bottle_fc", -1).is_err());

        assert!(validate_tender(50_000, 2_000).is_ok());
        assert!(validate_tender(i64::MAX, 0).is_err());
        assert!(validate_tender(0, i64::MAX / 10).is_err());
        assert!(validate_tender(-1, 0).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_prices_and_stock() {
        assert!(validate_price_fc("price_bottle_fc", 0).is_ok());
        assert!(validate_price_fc("price_bottle_fc", 2_500).is_ok());
        assert!(validate_price_fc("price_bottle_fc", -1).is_err());
        assert!(validate_stock("stock_crates", 0).is_ok());
        assert!(validate_stock("stock_crates", -3).is_err());
    }

    #[test]
    fn test_validate_packaging() {
        assert!(validate_packaging(24, 4).is_ok());
        assert!(validate_packaging(0, 4).is_err());
        assert!(validate_packaging(12, 0).is_err());
    }

    #[test]
    fn test_validate_paper_width() {
        assert!(validate_paper_width(58).is_ok());
        assert!(validate_paper_width(80).is_ok());
        assert!(validate_paper_width(72).is_err());
    }

    #[test]
    fn test_validate_sale_size() {
        assert!(validate_sale_size(1).is_ok());
        assert!(validate_sale_size(0).is_err());
        assert!(validate_sale_size(MAX_SALE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
