//! # Seed Data Generator
//!
//! Populates the database with a small catalog, opening stock, a few manual
//! movements and sales, all through the services so the ledger stays
//! consistent.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by STOCKROOM_DB_PATH (default ./stockroom.db)
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path and number of sales
//! cargo run -p stockroom-db --bin seed -- --db ./data/dev.db --sales 50
//! ```

use std::env;

use stockroom_core::{
    CategoryInput, CustomerInfo, MovementRequest, NewProduct, Product, SaleLineRequest,
    SaleRequest,
};
use stockroom_db::{init_tracing, Database, StockError, StoreConfig};
use tracing::{info, warn};

/// Category name, then (product name, cost cents, selling cents, opening qty).
const CATALOG: &[(&str, &[(&str, i64, i64, i64)])] = &[
    (
        "Beverages",
        &[
            ("Cola 330ml", 60, 100, 120),
            ("Orange Juice 1L", 150, 240, 40),
            ("Mineral Water 500ml", 25, 50, 200),
            ("Iced Tea 500ml", 70, 120, 8),
        ],
    ),
    (
        "Snacks",
        &[
            ("Salted Crisps", 45, 80, 60),
            ("Chocolate Bar", 55, 95, 90),
            ("Roasted Peanuts", 80, 140, 5),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap", 110, 190, 25),
            ("Paper Towels 2pk", 160, 260, 0),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = StoreConfig::load()?;
    let mut sales: usize = 10;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: $STOCKROOM_DB_PATH)");
                println!("  -s, --sales <N>     Number of sales to record (default: 10)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(config.db_config()).await?;
    info!(path = %config.database_path.display(), "Connected to database");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let products = seed_catalog(&db).await?;
    seed_movements(&db, &products).await?;
    let recorded = seed_sales(&db, &products, sales).await?;

    let stats = db
        .reports()
        .with_threshold(config.low_stock_threshold)
        .dashboard_stats(chrono::Utc::now())
        .await?;
    let drifting = db
        .reports()
        .audit_all()
        .await?
        .into_iter()
        .filter(|a| !a.is_consistent())
        .count();

    info!(
        products = stats.total_products,
        sales = recorded,
        revenue_cents = stats.total_revenue_cents,
        low_stock = stats.low_stock_count,
        out_of_stock = stats.out_of_stock_count,
        drifting,
        "Seed complete"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

async fn seed_catalog(db: &Database) -> Result<Vec<Product>, StockError> {
    let mut products = Vec::new();

    for (category_name, items) in CATALOG {
        let category = db
            .catalog()
            .create_category(&CategoryInput {
                name: category_name.to_string(),
                description: None,
            })
            .await?;

        for (name, cost, price, qty) in items.iter() {
            let product = db
                .catalog()
                .create_product(&NewProduct {
                    name: name.to_string(),
                    category_id: category.id.clone(),
                    cost_price_cents: *cost,
                    selling_price_cents: *price,
                    initial_quantity: *qty,
                    ..Default::default()
                })
                .await?;
            products.push(product);
        }
    }

    info!(count = products.len(), "Catalog seeded");
    Ok(products)
}

async fn seed_movements(db: &Database, products: &[Product]) -> Result<(), StockError> {
    for (idx, product) in products.iter().enumerate() {
        let request = match idx % 3 {
            0 => MovementRequest::stock_in(&product.id, 24, product.cost_price_cents)
                .with_notes("Weekly delivery"),
            1 if product.stock_quantity > 0 => {
                MovementRequest::stock_out(&product.id, 1).with_notes("Damaged")
            }
            _ => MovementRequest::stock_return(&product.id, 1).with_notes("Customer return"),
        };
        db.stock().record_movement(&request).await?;
    }
    Ok(())
}

/// Records up to `count` sales, skipping any that run out of stock.
async fn seed_sales(db: &Database, products: &[Product], count: usize) -> Result<usize, StockError> {
    let mut recorded = 0;

    for n in 0..count {
        let first = &products[n % products.len()];
        let second = &products[(n * 7 + 3) % products.len()];

        let lines: Vec<SaleLineRequest> = [(first, 1 + (n % 3) as i64), (second, 1)]
            .into_iter()
            .map(|(p, quantity)| SaleLineRequest {
                product_id: p.id.clone(),
                quantity,
                selling_price_cents: p.selling_price_cents,
            })
            .collect();
        let subtotal: i64 = lines.iter().map(|l| l.quantity * l.selling_price_cents).sum();

        let request = SaleRequest {
            sale_id: format!("SEED-{:04}", n + 1),
            customer: CustomerInfo {
                name: Some(format!("Customer {}", n + 1)),
                ..Default::default()
            },
            lines,
            subtotal_cents: subtotal,
            tax_cents: 0,
            total_cents: subtotal,
        };

        match db.checkout().complete_sale(&request).await {
            Ok(_) => recorded += 1,
            Err(StockError::InsufficientStock { name, .. }) => {
                warn!(sale_id = %request.sale_id, product = %name, "Skipped sale")
            }
            Err(e) => return Err(e),
        }
    }

    Ok(recorded)
}
