//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Catalog resolution for cart normalization (barcode → product map)
//! - CRUD operations
//! - Soft deactivation (an inactive product is invisible to checkout)

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasa_core::Product;

/// Row shape for the products table.
///
/// Decoded with `FromRow` and converted into the pure domain type, so
/// kasa-core never sees sqlx.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    barcode: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    category: Option<String>,
    tax_rate_bps: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            barcode: row.barcode,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            category: row.category,
            tax_rate_bps: row.tax_rate_bps as u32,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, barcode, name, description, price_cents, category, \
     tax_rate_bps, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Resolves a set of barcodes into a catalog map for normalization.
    ///
    /// Missing or inactive barcodes are simply absent from the map; the
    /// normalizer turns an absent barcode into an UnknownProduct error
    /// for the whole cart.
    pub async fn catalog_for(&self, barcodes: &[String]) -> DbResult<HashMap<String, Product>> {
        debug!(count = barcodes.len(), "Resolving checkout catalog");

        let mut catalog = HashMap::with_capacity(barcodes.len());
        for barcode in barcodes {
            if catalog.contains_key(barcode) {
                continue;
            }
            if let Some(product) = self.get_by_barcode(barcode).await? {
                if product.is_active {
                    catalog.insert(product.barcode.clone(), product);
                }
            }
        }
        Ok(catalog)
    }

    /// Lists active products, most recently updated first.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY updated_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Distinct categories across active products, for promotion scoping
    /// at the admin surface.
    pub async fn list_categories(&self) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM products \
             WHERE is_active = 1 AND category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    /// Inserts a product, returning its generated id.
    ///
    /// The `id` field of the argument is ignored.
    pub async fn insert(&self, product: &Product) -> DbResult<i64> {
        debug!(barcode = %product.barcode, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                barcode, name, description, price_cents, category,
                tax_rate_bps, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(product.tax_rate_bps as i64)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Updates price, name, description, category and tax rate by barcode.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                category = ?5,
                tax_rate_bps = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE barcode = ?1
            "#,
        )
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(product.tax_rate_bps as i64)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.barcode));
        }

        Ok(())
    }

    /// Soft-deactivates a product. History stays intact; the product
    /// just stops resolving at checkout.
    pub async fn deactivate(&self, barcode: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE barcode = ?1")
                .bind(barcode)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", barcode));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(barcode: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: 0,
            barcode: barcode.to_string(),
            name: format!("Product {barcode}"),
            description: None,
            price_cents,
            category: Some("drinks".to_string()),
            tax_rate_bps: 800,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let id = repo.insert(&product("001", 1000)).await.unwrap();
        assert!(id > 0);

        let found = repo.get_by_barcode("001").await.unwrap().unwrap();
        assert_eq!(found.price_cents, 1000);
        assert_eq!(found.category.as_deref(), Some("drinks"));
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("001", 1000)).await.unwrap();
        let err = repo.insert(&product("001", 2000)).await.unwrap_err();
        assert!(err.is_unique_violation_on("barcode"));
    }

    #[tokio::test]
    async fn test_catalog_excludes_inactive_and_unknown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("001", 1000)).await.unwrap();
        repo.insert(&product("002", 500)).await.unwrap();
        repo.deactivate("002").await.unwrap();

        let catalog = repo
            .catalog_for(&[
                "001".to_string(),
                "002".to_string(),
                "missing".to_string(),
            ])
            .await
            .unwrap();

        assert!(catalog.contains_key("001"));
        assert!(!catalog.contains_key("002"));
        assert!(!catalog.contains_key("missing"));
    }

    #[tokio::test]
    async fn test_list_categories_skips_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("001", 1000)).await.unwrap();
        let mut snack = product("002", 300);
        snack.category = Some("snacks".to_string());
        repo.insert(&snack).await.unwrap();
        let mut dead = product("003", 100);
        dead.category = Some("discontinued".to_string());
        repo.insert(&dead).await.unwrap();
        repo.deactivate("003").await.unwrap();

        let categories = repo.list_categories().await.unwrap();
        assert_eq!(categories, vec!["drinks", "snacks"]);
    }
}
