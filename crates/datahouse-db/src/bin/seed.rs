//! # Seed Data Generator
//!
//! Populates the database with a small catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default catalogue (every product below)
//! cargo run -p datahouse-db --bin seed
//!
//! # Only the first N products
//! cargo run -p datahouse-db --bin seed -- --count 5
//!
//! # Specify database path (otherwise DATAHOUSE_DB_PATH, then ./datahouse.db)
//! cargo run -p datahouse-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! Products get numeric codes allocated by the store ("1", "2", ...), the
//! same way the store-manager page creates them.

use datahouse_core::{Money, NewProduct};
use datahouse_db::{init_tracing, Database, DbConfig};
use std::env;
use tracing::{info, warn};

/// (name, price, stock, description)
const CATALOGUE: &[(&str, &str, i64, &str)] = &[
    ("Basmati Rice 5kg", "12.50", 40, "Long grain rice"),
    ("Green Tea 100g", "4.20", 60, "Loose leaf green tea"),
    ("Olive Oil 1L", "9.90", 25, "Extra virgin"),
    ("Whole Milk 1L", "1.15", 80, "Pasteurized"),
    ("Couscous 1kg", "2.80", 50, "Medium grain"),
    ("Dates 500g", "6.75", 30, "Medjool dates"),
    ("Mint Bunch", "0.60", 100, "Fresh mint"),
    ("Sugar 1kg", "1.05", 70, "White sugar"),
    ("Black Olives 400g", "3.40", 35, "Pitted"),
    ("Semolina 1kg", "1.90", 45, "Fine semolina"),
    ("Harissa 200g", "2.25", 40, "Chili paste"),
    ("Almonds 250g", "5.60", 20, "Roasted almonds"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count = CATALOGUE.len();
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(CATALOGUE.len());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Datahouse POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  -c, --count <N>    Number of products to insert (default: {})",
                    CATALOGUE.len()
                );
                println!("  -d, --db <PATH>    Database file path (default: $DATAHOUSE_DB_PATH or ./datahouse.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = DbConfig::from_env()?;
    if let Some(path) = db_path {
        config.database_path = path.into();
    }

    info!(path = %config.database_path.display(), count, "Seeding database");
    let db = Database::new(config).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let mut inserted = 0;
    for (name, price, quantity, description) in CATALOGUE.iter().take(count) {
        let product = NewProduct {
            code: None,
            name: name.to_string(),
            price: price.parse::<Money>()?,
            quantity: *quantity,
            description: description.to_string(),
            image: None,
        };

        match db.products().insert(&product).await {
            Ok(created) => {
                inserted += 1;
                info!(code = %created.code, name = %created.name, "Inserted product");
            }
            Err(e) => warn!(name = %name, error = %e, "Failed to insert product"),
        }
    }

    info!(inserted, "Seed complete");
    db.close().await;
    Ok(())
}
