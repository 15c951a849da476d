//! # Seed Data Generator
//!
//! Populates a database with development accounts and a starter catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./inventario.db
//! cargo run -p ferreteria-db --bin seed
//!
//! # Specify database URL
//! cargo run -p ferreteria-db --bin seed -- --db sqlite://./data/inventario.db
//!
//! # Accounts only
//! cargo run -p ferreteria-db --bin seed -- --users-only
//! ```
//!
//! Categories and suppliers come from the migrations. Starter items are
//! inserted with zero stock and then received through a stock
//! transaction, so their opening stock is on the movement log.

use std::env;
use std::time::Instant;

use ferreteria_core::auth::dev_users;
use ferreteria_core::{NewItem, NewMovement, Price};
use ferreteria_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (code, name, category_id, supplier_id, purchase cents, sale cents, opening stock, min stock)
const STARTER_ITEMS: &[(&str, &str, i64, i64, i64, i64, i64, i64)] = &[
    ("MART001", "Martillo de uña 16oz", 1, 1, 1000, 1500, 25, 5),
    ("DEST001", "Destornillador plano 1/4", 1, 1, 350, 600, 40, 10),
    ("ALIC001", "Alicate universal 8in", 1, 2, 1200, 1850, 15, 4),
    ("TALA001", "Taladro percutor 600W", 2, 3, 32000, 45900, 6, 2),
    ("SIER001", "Sierra circular 7 1/4", 2, 3, 54000, 72500, 3, 2),
    ("TORN025", "Tornillo drywall 1in (100u)", 3, 2, 180, 320, 200, 50),
    ("CLAV002", "Clavo 2in (1kg)", 3, 2, 250, 420, 80, 20),
    ("PINT001", "Pintura látex blanco galón", 4, 1, 6800, 9500, 12, 5),
    ("BROC002", "Brocha 2in", 4, 1, 150, 290, 30, 10),
    ("TUBO050", "Tubo PVC 1/2 x 6m", 5, 2, 900, 1400, 45, 15),
    ("LLAV001", "Llave de paso 1/2", 5, 2, 1100, 1750, 1, 5),
    ("CABL012", "Cable THHN 12 AWG (m)", 6, 3, 95, 160, 500, 100),
    ("INTE001", "Interruptor sencillo", 6, 3, 220, 390, 0, 10),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_url = String::from("sqlite://inventario.db");
    let mut users_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--users-only" => users_only = true,
            "--help" | "-h" => {
                println!("Ferreteria Inventory Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <URL>     Database URL (default: sqlite://inventario.db)");
                println!("      --users-only   Seed accounts only, no items");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Ferreteria Inventory Seed");
    println!("=========================");
    println!("Database: {}", db_url);
    println!();

    let db = Database::new(DbConfig::new(&db_url)).await?;
    let status = ferreteria_db::migrations::migration_status(db.pool()).await?;
    println!("✓ Connected, migrations {}/{}", status.applied, status.embedded);

    let start = Instant::now();

    // Accounts
    if db.users().count().await? > 0 {
        println!("⚠ Users table already populated, leaving accounts alone");
    } else {
        for user in dev_users() {
            db.users().upsert(&user).await?;
            println!("  + user {} ({})", user.username, user.role);
        }
    }

    if users_only {
        println!();
        println!("✓ Seed complete in {:?}", start.elapsed());
        return Ok(());
    }

    // Items
    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping catalog to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    for &(code, name, category_id, supplier_id, purchase, sale, stock, min_stock) in STARTER_ITEMS {
        let item = db
            .items()
            .insert(&NewItem {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                category_id: Some(category_id),
                supplier_id: Some(supplier_id),
                purchase_price: Price::from_cents(purchase),
                sale_price: Price::from_cents(sale),
                current_stock: 0,
                min_stock,
                active: true,
            })
            .await?;

        if stock > 0 {
            let mut tx = db.begin_stock_tx().await?;
            tx.lock_item(item.id).await?;
            tx.set_item_stock(item.id, stock).await?;
            tx.append_movement(&NewMovement::for_change(
                item.id,
                0,
                stock,
                false,
                Some("opening stock".to_string()),
                "seed",
            ))
            .await?;
            tx.commit().await?;
        }

        generated += 1;
    }

    let low = db.items().list_low_stock().await?;

    println!();
    println!("✓ Generated {} items in {:?}", generated, start.elapsed());
    println!("  Low stock right now: {}", low.len());
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
