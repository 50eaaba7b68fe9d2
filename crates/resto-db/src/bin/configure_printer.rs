//! # Printer Setup
//!
//! One-time configuration of the receipt printer for an establishment.
//!
//! ## Usage
//! ```bash
//! cargo run -p resto-db --bin configure-printer -- \
//!     --name "Chez Maman" --address "12 Av. Kasa-Vubu, Kinshasa" \
//!     --phone "+243 81 000 0000" --message "Merci et à bientôt !"
//! ```
//!
//! The printer is stored as `Imprimante <name>` and becomes the default.
//! Running the command again with the same name updates that printer.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use resto_core::{ConnectionType, Printer};
use resto_db::{Database, DbConfig, DbResult, PrinterInput};

/// Configure the default receipt printer.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Establishment name printed on receipts.
    #[arg(short, long, default_value = "Mon Restaurant")]
    name: String,

    /// Address line.
    #[arg(short, long, default_value = "Kinshasa, RDC")]
    address: String,

    /// Closing message at the bottom of each receipt.
    #[arg(short, long, default_value = "Merci pour votre visite !")]
    message: String,

    /// Contact phone number.
    #[arg(short, long, default_value = "+243 000 000 000")]
    phone: String,

    /// Database file path.
    #[arg(short, long, default_value = "./resto.db")]
    db: String,
}

impl Args {
    fn printer_name(&self) -> String {
        format!("Imprimante {}", self.name.trim())
    }

    fn to_input(&self) -> PrinterInput {
        PrinterInput {
            name: self.printer_name(),
            connection_type: ConnectionType::System,
            connection: None,
            paper_width: 80,
            header: Some(self.name.trim().to_string()),
            footer: Some(self.message.clone()),
            restaurant_name: self.name.trim().to_string(),
            restaurant_address: Some(self.address.clone()),
            restaurant_phone: Some(self.phone.clone()),
            restaurant_message: Some(self.message.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let db = Database::new(DbConfig::new(&args.db))
        .await
        .with_context(|| format!("opening {}", args.db))?;

    let printer = configure(&db, &args).await?;

    println!("Imprimante configurée");
    println!("{}", render_table(&printer_rows(&printer)));

    Ok(())
}

/// Upserts the printer and makes it the default.
async fn configure(db: &Database, args: &Args) -> DbResult<Printer> {
    let printer = db.printers().upsert_by_name(&args.to_input()).await?;
    let printer = db.printers().set_default(&printer.id).await?;

    info!(id = %printer.id, name = %printer.name, "Printer configured");
    Ok(printer)
}

fn printer_rows(printer: &Printer) -> Vec<(&'static str, String)> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    vec![
        ("Nom", printer.name.clone()),
        ("Restaurant", printer.restaurant_name.clone()),
        ("Adresse", opt(&printer.restaurant_address)),
        ("Téléphone", opt(&printer.restaurant_phone)),
        ("Message", opt(&printer.restaurant_message)),
        ("Largeur papier", format!("{} mm", printer.paper_width)),
        ("Par défaut", if printer.is_default { "Oui" } else { "Non" }.to_string()),
    ]
}

/// Two-column bordered table.
///
/// ```text
/// +---------+-----------------------+
/// | Champ   | Valeur                |
/// +---------+-----------------------+
/// | Nom     | Imprimante Chez Maman |
/// +---------+-----------------------+
/// ```
fn render_table(rows: &[(&str, String)]) -> String {
    let width = |s: &str| s.chars().count();
    let left = rows.iter().map(|(k, _)| width(k)).chain([width("Champ")]).max().unwrap_or(0);
    let right = rows.iter().map(|(_, v)| width(v)).chain([width("Valeur")]).max().unwrap_or(0);

    let border = format!("+{}+{}+", "-".repeat(left + 2), "-".repeat(right + 2));
    let line = |k: &str, v: &str| {
        format!(
            "| {}{} | {}{} |",
            k,
            " ".repeat(left - width(k)),
            v,
            " ".repeat(right - width(v))
        )
    };

    let mut out = vec![border.clone(), line("Champ", "Valeur"), border.clone()];
    out.extend(rows.iter().map(|(k, v)| line(k, v)));
    out.push(border);
    out.join("\n")
}
