//! # Factories
//!
//! Random but well-formed records for seeding and tests. Every generator
//! takes the caller's `Rng`, so a seeded `StdRng` gives repeatable data.
//!
//! Franc amounts are multiples of 50 FC. At the default rate 25 FC is one
//! US cent, so every generated amount converts to USD without rounding.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Builder;

use crate::money::{ExchangeRate, Fc, Usd};
use crate::pricing::{crate_price_from_bottle, glass_price_from_bottle, settle, Settlement, Tender};
use crate::types::{ConnectionType, PaymentMode, Printer, Product, Role, Sale, User};

const BEVERAGES: &[(&str, &str)] = &[
    ("Primus", "Bières"),
    ("Simba", "Bières"),
    ("Tembo", "Bières"),
    ("Heineken", "Bières"),
    ("Castel", "Bières"),
    ("Turbo King", "Bières"),
    ("Coca-Cola", "Sucrés"),
    ("Fanta", "Sucrés"),
    ("Sprite", "Sucrés"),
    ("Maltina", "Sucrés"),
    ("Eau Swissta", "Eaux"),
    ("Jus Vitalo", "Jus"),
];

const SIZES: &[&str] = &["33cl", "50cl", "65cl", "72cl"];

const FIRST_NAMES: &[&str] = &[
    "Amani", "Bénédicte", "Christian", "Divine", "Espoir", "Fiston", "Grâce", "Héritier",
    "Joël", "Merveille", "Patient", "Rachel",
];

const LAST_NAMES: &[&str] = &[
    "Kabila", "Mbuyi", "Ilunga", "Kasongo", "Mukendi", "Tshibanda", "Lukusa", "Ngoy",
];

const PRINTER_MODELS: &[&str] = &["Epson TM-T20", "Xprinter XP-58", "Star TSP100", "Bixolon SRP-350"];

/// A v4 UUID built from the caller's rng.
pub fn fake_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn round_to_50(fc: Fc) -> Fc {
    Fc::new((fc.francs() + 25) / 50 * 50)
}

fn fake_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

fn recent<R: Rng + ?Sized>(rng: &mut R) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(rng.gen_range(0..60 * 24 * 30))
}

// =============================================================================
// Product
// =============================================================================

pub fn fake_product<R: Rng + ?Sized>(rng: &mut R) -> Product {
    let (brand, category) = *BEVERAGES.choose(rng).unwrap_or(&BEVERAGES[0]);
    let size = pick(rng, SIZES);
    let bottles_per_crate = *[12i64, 20, 24].choose(rng).unwrap_or(&24);
    let glasses_per_bottle = *[3i64, 4, 5].choose(rng).unwrap_or(&4);

    let bottle = Fc::new(rng.gen_range(20..=120) * 50);
    let discount_bps = *[0i64, 500, 1_000].choose(rng).unwrap_or(&0);
    let crate_price = round_to_50(crate_price_from_bottle(bottle, bottles_per_crate, discount_bps));
    let glass_price = round_to_50(glass_price_from_bottle(bottle, glasses_per_bottle, 2_000));

    let created_at = recent(rng);
    let code = format!(
        "{}-{}-{:04}",
        brand.split_whitespace().next().unwrap_or(brand).to_uppercase(),
        size.trim_end_matches("cl"),
        rng.gen_range(0..10_000)
    );

    Product {
        id: fake_id(rng),
        name: format!("{} {}", brand, size),
        code,
        category: category.to_string(),
        unit_of_measure: "casier".to_string(),
        bottles_per_crate,
        glasses_per_bottle,
        stock_crates: rng.gen_range(0..=30),
        stock_bottles: rng.gen_range(0..bottles_per_crate),
        stock_glasses: rng.gen_range(0..glasses_per_bottle),
        min_stock: rng.gen_range(1..=4) * bottles_per_crate,
        price_crate_fc: crate_price.francs(),
        price_bottle_fc: bottle.francs(),
        price_glass_fc: glass_price.francs(),
        is_active: true,
        created_at,
        updated_at: created_at,
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A settled sale with a random total and a tender that covers it.
pub fn fake_settlement<R: Rng + ?Sized>(rng: &mut R, rate: ExchangeRate) -> Settlement {
    let total = Fc::new(rng.gen_range(2..=4_000) * 50);
    let mode = *[PaymentMode::Fc, PaymentMode::Usd, PaymentMode::Mixte]
        .choose(rng)
        .unwrap_or(&PaymentMode::Fc);

    // whole dollars covering `fc`
    let dollars_for = |fc: Fc| -> Usd {
        let per_usd = rate.francs_per_usd();
        Usd::from_cents((fc.francs() + per_usd - 1) / per_usd * 100)
    };

    let tender = match mode {
        PaymentMode::Fc => {
            let step = *[500i64, 1_000, 5_000].choose(rng).unwrap_or(&1_000);
            Tender {
                paid_fc: Fc::new((total.francs() + step - 1) / step * step),
                paid_usd: Usd::zero(),
            }
        }
        PaymentMode::Usd => Tender {
            paid_fc: Fc::zero(),
            paid_usd: dollars_for(total),
        },
        PaymentMode::Mixte => {
            let usd_part = Usd::from_cents(rng.gen_range(0..=total.francs() / rate.francs_per_usd()) * 100);
            let remaining = total - rate.to_fc(usd_part);
            Tender {
                paid_fc: Fc::new((remaining.francs().max(0) + 499) / 500 * 500),
                paid_usd: usd_part,
            }
        }
    };

    // every tender above covers the total; exact payment is the fallback
    settle(total, tender, mode, rate).unwrap_or_else(|_| Settlement::exact(total, rate))
}

pub fn fake_sale<R: Rng + ?Sized>(rng: &mut R, user_id: &str, rate: ExchangeRate) -> Sale {
    let settlement = fake_settlement(rng, rate);
    let created_at = recent(rng);
    let buyer = if rng.gen_bool(0.5) {
        Some(fake_name(rng))
    } else {
        None
    };
    settlement.into_sale(
        fake_id(rng),
        Sale::receipt_number_for(created_at.date_naive(), rng.gen_range(1..10_000)),
        user_id.to_string(),
        buyer,
        created_at,
    )
}

// =============================================================================
// Printer
// =============================================================================

pub fn fake_printer<R: Rng + ?Sized>(rng: &mut R) -> Printer {
    let model = pick(rng, PRINTER_MODELS);
    let connection_type = *[
        ConnectionType::Usb,
        ConnectionType::Network,
        ConnectionType::Bluetooth,
        ConnectionType::System,
    ]
    .choose(rng)
    .unwrap_or(&ConnectionType::System);
    let connection = match connection_type {
        ConnectionType::Usb => format!("/dev/usb/lp{}", rng.gen_range(0..4)),
        ConnectionType::Network => format!("192.168.1.{}:9100", rng.gen_range(2..250)),
        ConnectionType::Bluetooth => format!(
            "00:11:22:{:02X}:{:02X}:{:02X}",
            rng.gen::<u8>(),
            rng.gen::<u8>(),
            rng.gen::<u8>()
        ),
        ConnectionType::System => model.to_string(),
    };
    let restaurant = format!("Chez {}", pick(rng, FIRST_NAMES));
    let created_at = recent(rng);

    Printer {
        id: fake_id(rng),
        name: format!("{} #{}", model, rng.gen_range(1..100)),
        connection_type,
        connection: Some(connection),
        is_default: false,
        paper_width: *[58i64, 80].choose(rng).unwrap_or(&80),
        header: Some(restaurant.clone()),
        footer: Some("Merci pour votre visite !".to_string()),
        restaurant_name: restaurant,
        restaurant_address: Some(format!("{} Avenue du Commerce, Kinshasa", rng.gen_range(1..300))),
        restaurant_phone: Some(format!("+243 8{} {:03} {:04}", rng.gen_range(1..10), rng.gen_range(0..1000), rng.gen_range(0..10_000))),
        restaurant_message: Some("À bientôt !".to_string()),
        created_at,
        updated_at: created_at,
    }
}

// =============================================================================
// User
// =============================================================================

/// A user with an empty `password_hash`; callers hash a password before
/// storing it.
pub fn fake_user<R: Rng + ?Sized>(rng: &mut R, role: Role) -> User {
    let name = fake_name(rng);
    let email = format!(
        "{}.{}@resto.cd",
        name.split_whitespace().next().unwrap_or("user").to_lowercase(),
        rng.gen_range(100..1_000)
    );
    let created_at = recent(rng);

    User {
        id: fake_id(rng),
        name,
        email,
        password_hash: String::new(),
        role,
        is_active: true,
        created_at,
        updated_at: created_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StockUnit;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    const UNITS: [StockUnit; 3] = [StockUnit::Casier, StockUnit::Bouteille, StockUnit::Verre];

    #[test]
    fn test_same_seed_same_records() {
        let a = fake_product(&mut StdRng::seed_from_u64(7));
        let b = fake_product(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.code, b.code);
        assert_eq!(a.id, b.id);
        assert_eq!(a.price_crate_fc, b.price_crate_fc);
    }

    #[test]
    fn test_ids_are_v4() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = fake_id(&mut rng);
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_fake_user_keeps_role() {
        let mut rng = StdRng::seed_from_u64(3);
        let user = fake_user(&mut rng, Role::GestionnaireStock);
        assert_eq!(user.role, Role::GestionnaireStock);
        assert!(user.email.ends_with("@resto.cd"));
        assert!(user.password_hash.is_empty());
    }

    #[test]
    fn test_fake_printer_paper_width() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let p = fake_printer(&mut rng);
            assert!(p.paper_width == 58 || p.paper_width == 80);
            assert!(!p.is_default);
        }
    }

    proptest! {
        #[test]
        fn product_usd_prices_follow_rate(seed in any::<u64>()) {
            let product = fake_product(&mut StdRng::seed_from_u64(seed));
            let prices = product.prices(ExchangeRate::DEFAULT);
            for unit in UNITS {
                let fc = product.price_fc(unit).francs();
                let expected = ((fc as f64 / 2500.0) * 100.0).round() as i64;
                prop_assert_eq!(product.price_usd(unit, ExchangeRate::DEFAULT).cents(), expected);
            }
            prop_assert_eq!(prices.crate_fc.francs() % 50, 0);
            prop_assert_eq!(prices.glass_fc.francs() % 50, 0);
        }

        #[test]
        fn sale_amounts_are_consistent(seed in any::<u64>()) {
            let rate = ExchangeRate::DEFAULT;
            let sale = fake_sale(&mut StdRng::seed_from_u64(seed), "user-1", rate);
            let usd = |fc: i64| ((fc as f64 / 2500.0) * 100.0).round() as i64;

            prop_assert!(sale.montant_paye_fc >= sale.montant_total_fc);
            prop_assert_eq!(sale.rendu_fc, sale.montant_paye_fc - sale.montant_total_fc);
            prop_assert_eq!(sale.rendu_usd, sale.montant_paye_usd - sale.montant_total_usd);
            prop_assert_eq!(sale.montant_total_usd, usd(sale.montant_total_fc));
            prop_assert_eq!(sale.montant_paye_usd, usd(sale.montant_paye_fc));
            prop_assert_eq!(sale.rendu_usd, usd(sale.rendu_fc));
            prop_assert_eq!(sale.exchange_rate, 2500);
        }
    }
}
