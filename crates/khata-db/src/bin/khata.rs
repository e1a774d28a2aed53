//! # Khata Operator CLI
//!
//! Opens the local store (seeding it on first use) and prints what the
//! shop's screens would show.
//!
//! ## Usage
//! ```bash
//! cargo run -p khata-db --bin khata -- products
//! cargo run -p khata-db --bin khata -- --db ./data/khata.db dashboard
//! cargo run -p khata-db --bin khata -- restock <product-id> 12
//! cargo run -p khata-db --bin khata -- quote <product-id> <product-id> --no-gst
//! RUST_LOG=khata_db=debug cargo run -p khata-db --bin khata -- --json invoices
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use khata_db::{Database, DbConfig, DbError, ShopConfig};

#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "Khata - shop inventory, customers and GST invoices")]
#[command(version)]
struct Cli {
    /// Database file (defaults to KHATA_DB_PATH or ./khata.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    #[command(alias = "ls")]
    Products,
    /// List customers
    Customers,
    /// List saved invoices
    Invoices,
    /// Show today's dashboard
    Dashboard,
    /// Move a product's stock up or down
    Restock {
        /// Product ID
        id: String,
        /// Units to add (negative to remove)
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Price a basket at the shop's GST rate without saving it
    Quote {
        /// Product IDs; repeat an ID for more units
        #[arg(required = true)]
        ids: Vec<String>,
        /// Leave GST off
        #[arg(long)]
        no_gst: bool,
    },
    /// Show store version and record counts
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let shop = ShopConfig::from_env();
    let path = cli.db.clone().unwrap_or_else(|| shop.database_path.clone());

    info!(path = %path.display(), shop = %shop.shop_name, "Opening store");

    let config = DbConfig::new(path).staleness_window(shop.cache_config().staleness_window);
    let db = Database::new(config).await?;

    match cli.command {
        Commands::Products => {
            let products = db.products().list().await?;
            if cli.json {
                print_json(&products)?;
            } else {
                for p in &products {
                    let flag = if p.is_low_stock(shop.low_stock_threshold) {
                        "  LOW"
                    } else {
                        ""
                    };
                    println!(
                        "{:<38} {:<10} {:>12} {:>5}{}  {}",
                        p.id,
                        p.sku,
                        shop.format_currency(p.price_paise),
                        p.stock_qty,
                        flag,
                        p.name
                    );
                }
            }
        }
        Commands::Customers => {
            let customers = db.customers().list().await?;
            if cli.json {
                print_json(&customers)?;
            } else {
                for c in &customers {
                    println!("{:<38} {:<14} {}  ({})", c.id, c.phone, c.name, c.address);
                }
            }
        }
        Commands::Invoices => {
            let invoices = db.invoices().list().await?;
            if cli.json {
                print_json(&invoices)?;
            } else if invoices.is_empty() {
                println!("No invoices yet");
            } else {
                for inv in &invoices {
                    println!(
                        "{:<20} {:<26} {:<10} {:>12}",
                        inv.number.as_deref().unwrap_or(&inv.id),
                        inv.date,
                        format!("{:?}", inv.status).to_lowercase(),
                        shop.format_currency(inv.total_paise)
                    );
                }
            }
        }
        Commands::Dashboard => {
            let now = chrono::Local::now();
            let summary = db.dashboard_for(&now, shop.low_stock_threshold).await?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!("{} - {}", shop.shop_name, summary.day);
                println!(
                    "  Today's sales:       {}",
                    shop.format_currency(summary.today_sales_paise)
                );
                println!(
                    "  Pending receivables: {}",
                    shop.format_currency(summary.pending_receivables_paise)
                );
                println!("  Low-stock products:  {}", summary.low_stock_count);
                for month in &summary.monthly_sales {
                    println!(
                        "  {}  {}",
                        month.month,
                        shop.format_currency(month.total_paise)
                    );
                }
            }
        }
        Commands::Restock { id, delta } => {
            let product = db.products().adjust_stock(&id, delta).await?;
            println!("{} now has {} in stock", product.name, product.stock_qty);
        }
        Commands::Quote { ids, no_gst } => {
            let products = db.products().list().await?;
            let mut draft = shop.new_draft();
            draft.set_gst(!no_gst);

            for id in &ids {
                let product = products
                    .iter()
                    .find(|p| &p.id == id)
                    .ok_or_else(|| DbError::not_found("Product", id.as_str()))?;
                if draft.add_product(product).is_none() {
                    warn!(id = %id, "Unit skipped, invoice total out of range");
                }
            }

            let totals = draft.totals();
            if cli.json {
                print_json(&totals)?;
            } else {
                for line in draft.items() {
                    println!(
                        "{:>4} x {:<32} {:>12}",
                        line.quantity,
                        line.name,
                        shop.format_currency(line.total_paise)
                    );
                }
                println!("  Subtotal: {}", shop.format_currency(totals.subtotal_paise));
                println!("  GST:      {}", shop.format_currency(totals.tax_paise));
                println!("  Total:    {}", shop.format_currency(totals.total_paise));
            }
        }
        Commands::Status => {
            let store = db.store();
            println!(
                "version:   {}",
                store.version().await?.unwrap_or_else(|| "-".to_string())
            );
            for ns in khata_db::Namespace::ALL {
                println!("{:<10} {}", format!("{}:", ns), store.count(ns).await?);
            }
        }
    }

    db.close().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=khata_db=trace` - Show trace for the store only
/// - Default: INFO, debug for khata crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,khata_db=debug,khata=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
