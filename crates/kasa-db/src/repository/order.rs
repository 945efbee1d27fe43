//! # Order Repository
//!
//! Atomic persistence of priced orders and their lines.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 insert_with_lines (one transaction)                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT orders ──► generated id                                      │
//! │    INSERT order_lines (id, …) ×N  ← every line carries that id         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure (duplicate order_number included) rolls the whole         │
//! │  order back. There is never a half-persisted order.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are immutable after insertion, except `sync_status` which the
//! export collaborator flips once the payload has shipped.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasa_core::{Order, OrderLine, OrderStatus, OrderType, PaymentMethod};

// =============================================================================
// Row Shapes
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    order_type: OrderType,
    session_id: i64,
    cashier_name: String,
    status: OrderStatus,
    subtotal_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_vat: Option<String>,
    original_order_number: Option<String>,
    return_reason: Option<String>,
    notes: Option<String>,
    order_json: Option<String>,
    sync_status: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            order_type: row.order_type,
            session_id: row.session_id,
            cashier_name: row.cashier_name,
            status: row.status,
            subtotal_cents: row.subtotal_cents,
            discount_cents: row.discount_cents,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            payment_method: row.payment_method,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_vat: row.customer_vat,
            original_order_number: row.original_order_number,
            return_reason: row.return_reason,
            notes: row.notes,
            order_json: row.order_json,
            sync_status: row.sync_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: String,
    order_id: i64,
    product_barcode: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    free_items: i64,
    subtotal_cents: i64,
    discount_cents: i64,
    tax_rate_bps: i64,
    tax_cents: i64,
    total_cents: i64,
    promotion_label: Option<String>,
    is_reward: bool,
    created_at: DateTime<Utc>,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_barcode: row.product_barcode,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            free_items: row.free_items,
            subtotal_cents: row.subtotal_cents,
            discount_cents: row.discount_cents,
            tax_rate_bps: row.tax_rate_bps as u32,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            promotion_label: row.promotion_label,
            is_reward: row.is_reward,
            created_at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, order_type, session_id, cashier_name, status, \
     subtotal_cents, discount_cents, tax_cents, total_cents, payment_method, \
     customer_name, customer_phone, customer_vat, original_order_number, \
     return_reason, notes, order_json, sync_status, created_at, updated_at";

const LINE_COLUMNS: &str = "id, order_id, product_barcode, product_name, quantity, \
     unit_price_cents, free_items, subtotal_cents, discount_cents, \
     tax_rate_bps, tax_cents, total_cents, promotion_label, is_reward, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with all its lines in one transaction,
    /// returning the generated order id.
    ///
    /// The `id` field of the order and the `order_id` fields of the
    /// lines are ignored; the generated id is stamped onto every line.
    /// A duplicate `order_number` surfaces as
    /// [`DbError::UniqueViolation`] and nothing is persisted.
    pub async fn insert_with_lines(&self, order: &Order, lines: &[OrderLine]) -> DbResult<i64> {
        debug!(
            order_number = %order.order_number,
            lines = lines.len(),
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                order_number, order_type, session_id, cashier_name, status,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                payment_method, customer_name, customer_phone, customer_vat,
                original_order_number, return_reason, notes, order_json,
                sync_status, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17,
                ?18, ?19, ?20
            )
            "#,
        )
        .bind(&order.order_number)
        .bind(order.order_type)
        .bind(order.session_id)
        .bind(&order.cashier_name)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.payment_method)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_vat)
        .bind(&order.original_order_number)
        .bind(&order.return_reason)
        .bind(&order.notes)
        .bind(&order.order_json)
        .bind(order.sync_status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, product_barcode, product_name, quantity,
                    unit_price_cents, free_items, subtotal_cents, discount_cents,
                    tax_rate_bps, tax_cents, total_cents,
                    promotion_label, is_reward, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                "#,
            )
            .bind(&line.id)
            .bind(order_id)
            .bind(&line.product_barcode)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.free_items)
            .bind(line.subtotal_cents)
            .bind(line.discount_cents)
            .bind(line.tax_rate_bps as i64)
            .bind(line.tax_cents)
            .bind(line.total_cents)
            .bind(&line.promotion_label)
            .bind(line.is_reward)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order_id)
    }

    /// Gets an order by its human-readable order number.
    pub async fn get_by_order_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Gets the lines of an order, in insertion order.
    pub async fn get_lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY rowid"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Lists every order of a session, newest first.
    pub async fn list_by_session(&self, session_id: i64) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE session_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Lists orders whose export payload has not shipped yet, oldest
    /// first so the exporter drains in order.
    pub async fn list_unsynced(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE sync_status = 0 ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Flips the sync flag on an order.
    pub async fn update_sync_status(&self, order_number: &str, synced: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET sync_status = ?2, updated_at = ?3 WHERE order_number = ?1",
        )
        .bind(order_number)
        .bind(synced)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_number));
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
    use uuid::Uuid;

    async fn open_session(db: &Database) -> i64 {
        db.sessions()
            .insert(1, "alice", 10_000, Utc::now())
            .await
            .unwrap()
    }

    fn order(session_id: i64, number: &str, total_cents: i64) -> Order {
        let now = Utc::now();
        Order {
            id: 0,
            order_number: number.to_string(),
            order_type: OrderType::Sale,
            session_id,
            cashier_name: "alice".to_string(),
            status: OrderStatus::Completed,
            subtotal_cents: total_cents,
            discount_cents: 0,
            tax_cents: 0,
            total_cents,
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_phone: None,
            customer_vat: None,
            original_order_number: None,
            return_reason: None,
            notes: None,
            order_json: None,
            sync_status: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(barcode: &str, quantity: i64, total_cents: i64) -> OrderLine {
        OrderLine {
            id: Uuid::new_v4().to_string(),
            order_id: 0,
            product_barcode: barcode.to_string(),
            product_name: format!("Product {barcode}"),
            quantity,
            unit_price_cents: total_cents / quantity.max(1),
            free_items: 0,
            subtotal_cents: total_cents,
            discount_cents: 0,
            tax_rate_bps: 0,
            tax_cents: 0,
            total_cents,
            promotion_label: None,
            is_reward: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_with_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session_id = open_session(&db).await;
        let repo = db.orders();

        let id = repo
            .insert_with_lines(
                &order(session_id, "ORD-1", 1500),
                &[line("001", 2, 1000), line("002", 1, 500)],
            )
            .await
            .unwrap();

        let fetched = repo.get_by_order_number("ORD-1").await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.total_cents, 1500);

        let lines = repo.get_lines(id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_barcode, "001");
        assert!(lines.iter().all(|l| l.order_id == id));
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rolls_back_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session_id = open_session(&db).await;
        let repo = db.orders();

        repo.insert_with_lines(&order(session_id, "ORD-1", 500), &[line("001", 1, 500)])
            .await
            .unwrap();

        let err = repo
            .insert_with_lines(&order(session_id, "ORD-1", 900), &[line("002", 1, 900)])
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("order_number"));

        // Only the first order's line exists.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_sync_status_surface() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session_id = open_session(&db).await;
        let repo = db.orders();

        repo.insert_with_lines(&order(session_id, "ORD-1", 500), &[line("001", 1, 500)])
            .await
            .unwrap();
        repo.insert_with_lines(&order(session_id, "ORD-2", 700), &[line("002", 1, 700)])
            .await
            .unwrap();

        assert_eq!(repo.list_unsynced().await.unwrap().len(), 2);

        repo.update_sync_status("ORD-1", true).await.unwrap();
        let unsynced = repo.list_unsynced().await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].order_number, "ORD-2");

        let err = repo.update_sync_status("ORD-404", true).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
