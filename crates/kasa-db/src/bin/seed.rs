//! # Seed Data Generator
//!
//! Populates the database with demo products and rules for development.
//!
//! ## Usage
//! ```bash
//! # Seed into the default dev database
//! cargo run -p kasa-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasa-db --bin seed -- --db ./data/kasa.db
//! ```
//!
//! ## Generated Data
//! - A small grocery catalog across categories (drinks, snacks, bakery)
//! - One BUY_X_GET_Y loyalty rule and one "buy N for $M" rule
//! - A category promotion and a storewide promotion

use chrono::Utc;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kasa_core::{
    LoyaltyKind, LoyaltyRule, Product, PromotionDiscount, PromotionRule, RuleScope,
};
use kasa_db::{Database, DbConfig};

/// (barcode, name, category, price_cents, tax_rate_bps)
const PRODUCTS: &[(&str, &str, &str, i64, u32)] = &[
    ("1001", "Cola 330ml", "drinks", 150, 800),
    ("1002", "Cola 1.5L", "drinks", 350, 800),
    ("1003", "Orange Juice 1L", "drinks", 420, 800),
    ("1004", "Sparkling Water 500ml", "drinks", 120, 800),
    ("2001", "Potato Chips", "snacks", 280, 800),
    ("2002", "Chocolate Bar", "snacks", 190, 800),
    ("2003", "Trail Mix", "snacks", 450, 800),
    ("3001", "White Bread", "bakery", 220, 0),
    ("3002", "Croissant", "bakery", 180, 0),
    ("3003", "Bagel 4-Pack", "bakery", 390, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./kasa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasa POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding Kasa POS database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().list_active(1).await?;
    if !existing.is_empty() {
        info!("Database already seeded, skipping. Delete the file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    for (barcode, name, category, price_cents, tax_rate_bps) in PRODUCTS {
        db.products()
            .insert(&Product {
                id: 0,
                barcode: barcode.to_string(),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                category: Some(category.to_string()),
                tax_rate_bps: *tax_rate_bps,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    info!(count = PRODUCTS.len(), "Products seeded");

    // Buy 2 Cola 330ml, get 1 Sparkling Water free.
    db.rules()
        .insert_loyalty(&LoyaltyRule {
            id: 0,
            name: "Buy 2 Colas Get 1 Water".to_string(),
            kind: LoyaltyKind::BuyXGetY,
            trigger_barcodes: vec!["1001".to_string()],
            reward_barcodes: vec!["1004".to_string()],
            min_quantity: 2,
            max_quantity: Some(3),
            reward_quantity: 1,
            discount_percent_bps: 0,
            set_discount_cents: None,
            after_discount_cents: None,
            set_price_cents: None,
            is_active: true,
            start_date: None,
            end_date: None,
            program_ref: None,
            rule_ref: None,
        })
        .await?;

    // 3 croissants for $4.50 ($0.90 off per set).
    db.rules()
        .insert_loyalty(&LoyaltyRule {
            id: 0,
            name: "3 Croissants for $4.50".to_string(),
            kind: LoyaltyKind::Discount,
            trigger_barcodes: vec!["3002".to_string()],
            reward_barcodes: vec!["3002".to_string()],
            min_quantity: 3,
            max_quantity: None,
            reward_quantity: 0,
            discount_percent_bps: 0,
            set_discount_cents: Some(90),
            after_discount_cents: Some(450),
            set_price_cents: Some(180),
            is_active: true,
            start_date: None,
            end_date: None,
            program_ref: None,
            rule_ref: None,
        })
        .await?;

    // 10% off all drinks.
    db.rules()
        .insert_promotion(&PromotionRule {
            id: 0,
            name: "Drinks 10% Off".to_string(),
            description: Some("Storewide drinks promotion".to_string()),
            discount: PromotionDiscount::Percentage(1000),
            scope: RuleScope::ByCategory("drinks".to_string()),
            min_purchase_cents: 0,
            max_discount_cents: None,
            is_active: true,
            start_date: None,
            end_date: None,
        })
        .await?;

    // $2.00 off any line worth $20.00 or more.
    db.rules()
        .insert_promotion(&PromotionRule {
            id: 0,
            name: "Big Basket $2 Off".to_string(),
            description: None,
            discount: PromotionDiscount::FixedAmount(200),
            scope: RuleScope::Unscoped,
            min_purchase_cents: 2000,
            max_discount_cents: Some(200),
            is_active: true,
            start_date: None,
            end_date: None,
        })
        .await?;

    info!("Rules seeded");
    info!("Seed complete");

    Ok(())
}
