//! # Session Repository
//!
//! Session lifecycle and the dual aggregation strategy.
//!
//! ## Dual Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Session Totals, Two Ways                              │
//! │                                                                         │
//! │  HOT PATH (per order)                                                  │
//! │    add_order_total(session_id, delta)                                  │
//! │      UPDATE pos_sessions                                               │
//! │         SET total_sales_cents = total_sales_cents + ?delta,            │
//! │             transaction_count = transaction_count + 1                  │
//! │       WHERE id = ? AND status = 'OPEN'   ← guard doubles as the        │
//! │                                            open-session check          │
//! │                                                                         │
//! │  CLOSE (authoritative)                                                 │
//! │    completed_session_totals(session_id)                                │
//! │      SELECT SUM(total_cents), COUNT(*) FROM orders                     │
//! │       WHERE session_id = ? AND status = 'COMPLETED'                    │
//! │    close() writes those figures, overriding the running counters.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasa_core::{PosSession, SessionStatus};

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    session_number: i64,
    cashier_name: String,
    opening_cash_cents: i64,
    closing_cash_cents: Option<i64>,
    total_sales_cents: i64,
    transaction_count: i64,
    status: SessionStatus,
    notes: Option<String>,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for PosSession {
    fn from(row: SessionRow) -> Self {
        PosSession {
            id: row.id,
            session_number: row.session_number,
            cashier_name: row.cashier_name,
            opening_cash_cents: row.opening_cash_cents,
            closing_cash_cents: row.closing_cash_cents,
            total_sales_cents: row.total_sales_cents,
            transaction_count: row.transaction_count,
            status: row.status,
            notes: row.notes,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
        }
    }
}

const SESSION_COLUMNS: &str = "id, session_number, cashier_name, opening_cash_cents, \
     closing_cash_cents, total_sales_cents, transaction_count, status, \
     notes, opened_at, closed_at";

/// Repository for POS session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Inserts a fresh OPEN session, returning its generated id.
    pub async fn insert(
        &self,
        session_number: i64,
        cashier_name: &str,
        opening_cash_cents: i64,
        opened_at: DateTime<Utc>,
    ) -> DbResult<i64> {
        debug!(cashier = %cashier_name, session_number, "Opening session");

        let result = sqlx::query(
            r#"
            INSERT INTO pos_sessions (
                session_number, cashier_name, opening_cash_cents,
                total_sales_cents, transaction_count, status, opened_at
            ) VALUES (?1, ?2, ?3, 0, 0, 'OPEN', ?4)
            "#,
        )
        .bind(session_number)
        .bind(cashier_name)
        .bind(opening_cash_cents)
        .bind(opened_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Gets a session by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<PosSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM pos_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PosSession::from))
    }

    /// Finds the most recent OPEN session of a cashier, if any.
    /// Re-opening the POS reuses it instead of stranding the old one.
    pub async fn find_active_by_cashier(&self, cashier_name: &str) -> DbResult<Option<PosSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM pos_sessions \
             WHERE cashier_name = ?1 AND status = 'OPEN' \
             ORDER BY opened_at DESC LIMIT 1"
        ))
        .bind(cashier_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PosSession::from))
    }

    /// Next per-cashier session number (1, 2, 3, ...).
    pub async fn next_session_number(&self, cashier_name: &str) -> DbResult<i64> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(session_number) FROM pos_sessions WHERE cashier_name = ?1",
        )
        .bind(cashier_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(max.unwrap_or(0) + 1)
    }

    /// Hot-path accumulation: adds one order's total to the running
    /// session figures in a single guarded UPDATE.
    ///
    /// The `status = 'OPEN'` guard makes the update itself the open
    /// check: a closed or missing session affects zero rows and returns
    /// NotFound, so an order can never count toward a closed session.
    pub async fn add_order_total(&self, session_id: i64, delta_cents: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pos_sessions SET
                total_sales_cents = total_sales_cents + ?2,
                transaction_count = transaction_count + 1
            WHERE id = ?1 AND status = 'OPEN'
            "#,
        )
        .bind(session_id)
        .bind(delta_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Session (open)", session_id.to_string()));
        }

        Ok(())
    }

    /// Authoritative totals from persisted COMPLETED orders.
    ///
    /// Returns `(total_cents, order_count)`. PENDING, CANCELLED and
    /// REFUNDED orders are excluded.
    pub async fn completed_session_totals(&self, session_id: i64) -> DbResult<(i64, i64)> {
        let (total, count): (Option<i64>, i64) = sqlx::query_as(
            r#"
            SELECT SUM(total_cents), COUNT(*)
            FROM orders
            WHERE session_id = ?1 AND status = 'COMPLETED'
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((total.unwrap_or(0), count))
    }

    /// Closes a session, writing the authoritative totals.
    ///
    /// Guarded the same way as [`Self::add_order_total`]: closing an
    /// already-closed session affects zero rows and returns NotFound,
    /// which makes close idempotent-safe under concurrency.
    pub async fn close(
        &self,
        session_id: i64,
        closing_cash_cents: i64,
        total_sales_cents: i64,
        transaction_count: i64,
        notes: Option<&str>,
        closed_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(session_id, total_sales_cents, "Closing session");

        let result = sqlx::query(
            r#"
            UPDATE pos_sessions SET
                status = 'CLOSED',
                closing_cash_cents = ?2,
                total_sales_cents = ?3,
                transaction_count = ?4,
                notes = COALESCE(?5, notes),
                closed_at = ?6
            WHERE id = ?1 AND status = 'OPEN'
            "#,
        )
        .bind(session_id)
        .bind(closing_cash_cents)
        .bind(total_sales_cents)
        .bind(transaction_count)
        .bind(notes)
        .bind(closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Session (open)", session_id.to_string()));
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

    #[tokio::test]
    async fn test_open_and_find_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();

        assert!(repo.find_active_by_cashier("alice").await.unwrap().is_none());
        assert_eq!(repo.next_session_number("alice").await.unwrap(), 1);

        let id = repo.insert(1, "alice", 10_000, Utc::now()).await.unwrap();

        let session = repo.find_active_by_cashier("alice").await.unwrap().unwrap();
        assert_eq!(session.id, id);
        assert!(session.is_open());
        assert_eq!(repo.next_session_number("alice").await.unwrap(), 2);

        // Other cashiers have their own sequence and no open session.
        assert!(repo.find_active_by_cashier("bob").await.unwrap().is_none());
        assert_eq!(repo.next_session_number("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_order_total_accumulates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();
        let id = repo.insert(1, "alice", 0, Utc::now()).await.unwrap();

        repo.add_order_total(id, 500).await.unwrap();
        repo.add_order_total(id, 750).await.unwrap();
        repo.add_order_total(id, -200).await.unwrap(); // a return

        let session = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(session.total_sales_cents, 1050);
        assert_eq!(session.transaction_count, 3);
    }

    #[tokio::test]
    async fn test_guarded_update_rejects_closed_session() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();
        let id = repo.insert(1, "alice", 0, Utc::now()).await.unwrap();

        repo.close(id, 0, 0, 0, None, Utc::now()).await.unwrap();

        let err = repo.add_order_total(id, 500).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Closing twice is rejected the same way.
        let err = repo.close(id, 0, 0, 0, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_close_writes_authoritative_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();
        let id = repo.insert(1, "alice", 10_000, Utc::now()).await.unwrap();

        // Running counter drifted (e.g. crash between insert and update);
        // close writes the authoritative figures regardless.
        repo.add_order_total(id, 999).await.unwrap();
        repo.close(id, 12_000, 500, 1, Some("till short"), Utc::now())
            .await
            .unwrap();

        let session = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.total_sales_cents, 500);
        assert_eq!(session.transaction_count, 1);
        assert_eq!(session.closing_cash_cents, Some(12_000));
        assert_eq!(session.notes.as_deref(), Some("till short"));
        assert!(session.closed_at.is_some());
    }

    #[tokio::test]
    async fn test_completed_totals_empty_session() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();
        let id = repo.insert(1, "alice", 0, Utc::now()).await.unwrap();

        let (total, count) = repo.completed_session_totals(id).await.unwrap();
        assert_eq!((total, count), (0, 0));
    }
}
