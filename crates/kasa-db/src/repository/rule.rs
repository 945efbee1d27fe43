//! # Rule Repository
//!
//! Storage for both rule families the pricing engine evaluates.
//!
//! ## Storage Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Row ↔ Domain Mapping                                   │
//! │                                                                         │
//! │  loyalty_rules.trigger_barcodes  "001,002"  ⇄  Vec<String>             │
//! │  loyalty_rules.kind              "BUY_X_GET_Y" ⇄ LoyaltyKind           │
//! │                                                                         │
//! │  promotion_rules.product_barcode ┐                                     │
//! │  promotion_rules.category        ├─► RuleScope                         │
//! │        barcode set   → ByBarcode │   (barcode wins if both are set)    │
//! │        category set  → ByCategory│                                     │
//! │        both NULL     → Unscoped  ┘                                     │
//! │                                                                         │
//! │  promotion_rules.discount_type + discount_value ⇄ PromotionDiscount    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time-window filtering is NOT done in SQL: repositories return every
//! active rule and the matcher judges windows against its one snapshot
//! instant, so a pricing pass can be replayed for any point in time.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasa_core::{LoyaltyKind, LoyaltyRule, PromotionDiscount, PromotionRule, RuleScope};

// =============================================================================
// Row Shapes
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LoyaltyRow {
    id: i64,
    name: String,
    kind: LoyaltyKind,
    trigger_barcodes: String,
    reward_barcodes: String,
    min_quantity: i64,
    max_quantity: Option<i64>,
    reward_quantity: i64,
    discount_percent_bps: i64,
    set_discount_cents: Option<i64>,
    after_discount_cents: Option<i64>,
    set_price_cents: Option<i64>,
    is_active: bool,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    program_ref: Option<i64>,
    rule_ref: Option<i64>,
}

impl From<LoyaltyRow> for LoyaltyRule {
    fn from(row: LoyaltyRow) -> Self {
        LoyaltyRule {
            id: row.id,
            name: row.name,
            kind: row.kind,
            trigger_barcodes: split_barcodes(&row.trigger_barcodes),
            reward_barcodes: split_barcodes(&row.reward_barcodes),
            min_quantity: row.min_quantity,
            max_quantity: row.max_quantity,
            reward_quantity: row.reward_quantity,
            discount_percent_bps: row.discount_percent_bps as u32,
            set_discount_cents: row.set_discount_cents,
            after_discount_cents: row.after_discount_cents,
            set_price_cents: row.set_price_cents,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
            program_ref: row.program_ref,
            rule_ref: row.rule_ref,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PromotionRow {
    id: i64,
    name: String,
    description: Option<String>,
    discount_type: String,
    discount_value: i64,
    product_barcode: Option<String>,
    category: Option<String>,
    min_purchase_cents: i64,
    max_discount_cents: Option<i64>,
    is_active: bool,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl From<PromotionRow> for PromotionRule {
    fn from(row: PromotionRow) -> Self {
        let discount = match row.discount_type.as_str() {
            "FIXED_AMOUNT" => PromotionDiscount::FixedAmount(row.discount_value),
            // Unknown types decode as percentage of 0 bps rather than
            // failing the whole rule load.
            "PERCENTAGE" => PromotionDiscount::Percentage(row.discount_value as u32),
            _ => PromotionDiscount::Percentage(0),
        };

        let scope = match (row.product_barcode, row.category) {
            (Some(barcode), _) => RuleScope::ByBarcode(barcode),
            (None, Some(category)) => RuleScope::ByCategory(category),
            (None, None) => RuleScope::Unscoped,
        };

        PromotionRule {
            id: row.id,
            name: row.name,
            description: row.description,
            discount,
            scope,
            min_purchase_cents: row.min_purchase_cents,
            max_discount_cents: row.max_discount_cents,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

/// Barcode lists are stored comma-separated, no spaces.
fn split_barcodes(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_barcodes(barcodes: &[String]) -> String {
    barcodes.join(",")
}

fn discount_columns(discount: &PromotionDiscount) -> (&'static str, i64) {
    match discount {
        PromotionDiscount::Percentage(bps) => ("PERCENTAGE", *bps as i64),
        PromotionDiscount::FixedAmount(cents) => ("FIXED_AMOUNT", *cents),
    }
}

fn scope_columns(scope: &RuleScope) -> (Option<&str>, Option<&str>) {
    match scope {
        RuleScope::ByBarcode(barcode) => (Some(barcode.as_str()), None),
        RuleScope::ByCategory(category) => (None, Some(category.as_str())),
        RuleScope::Unscoped => (None, None),
    }
}

const LOYALTY_COLUMNS: &str = "id, name, kind, trigger_barcodes, reward_barcodes, \
     min_quantity, max_quantity, reward_quantity, discount_percent_bps, \
     set_discount_cents, after_discount_cents, set_price_cents, \
     is_active, start_date, end_date, program_ref, rule_ref";

const PROMOTION_COLUMNS: &str = "id, name, description, discount_type, discount_value, \
     product_barcode, category, min_purchase_cents, max_discount_cents, \
     is_active, start_date, end_date";

// =============================================================================
// Repository
// =============================================================================

/// Repository for loyalty and promotion rules.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    pool: SqlitePool,
}

impl RuleRepository {
    /// Creates a new RuleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RuleRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Loyalty
    // -------------------------------------------------------------------------

    /// Lists active loyalty rules, id ascending.
    ///
    /// Validity windows are NOT applied here; the matcher judges them
    /// against the pricing pass's snapshot instant.
    pub async fn list_active_loyalty(&self) -> DbResult<Vec<LoyaltyRule>> {
        let rows: Vec<LoyaltyRow> = sqlx::query_as(&format!(
            "SELECT {LOYALTY_COLUMNS} FROM loyalty_rules WHERE is_active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoyaltyRule::from).collect())
    }

    /// Inserts a loyalty rule, returning its generated id.
    ///
    /// The `id` field of the argument is ignored.
    pub async fn insert_loyalty(&self, rule: &LoyaltyRule) -> DbResult<i64> {
        debug!(name = %rule.name, "Inserting loyalty rule");
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO loyalty_rules (
                name, kind, trigger_barcodes, reward_barcodes,
                min_quantity, max_quantity, reward_quantity,
                discount_percent_bps, set_discount_cents,
                after_discount_cents, set_price_cents,
                is_active, start_date, end_date,
                program_ref, rule_ref, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
            "#,
        )
        .bind(&rule.name)
        .bind(rule.kind)
        .bind(join_barcodes(&rule.trigger_barcodes))
        .bind(join_barcodes(&rule.reward_barcodes))
        .bind(rule.min_quantity)
        .bind(rule.max_quantity)
        .bind(rule.reward_quantity)
        .bind(rule.discount_percent_bps as i64)
        .bind(rule.set_discount_cents)
        .bind(rule.after_discount_cents)
        .bind(rule.set_price_cents)
        .bind(rule.is_active)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.program_ref)
        .bind(rule.rule_ref)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Upserts a loyalty rule keyed on its upstream program identifier.
    ///
    /// Imported programs are re-sent on every sync; the program_ref keeps
    /// them from duplicating while letting parameters change in place.
    pub async fn upsert_loyalty_by_program_ref(&self, rule: &LoyaltyRule) -> DbResult<i64> {
        let program_ref = match rule.program_ref {
            Some(p) => p,
            None => return self.insert_loyalty(rule).await,
        };

        debug!(program_ref, name = %rule.name, "Upserting loyalty rule");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO loyalty_rules (
                name, kind, trigger_barcodes, reward_barcodes,
                min_quantity, max_quantity, reward_quantity,
                discount_percent_bps, set_discount_cents,
                after_discount_cents, set_price_cents,
                is_active, start_date, end_date,
                program_ref, rule_ref, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
            ON CONFLICT(program_ref) WHERE program_ref IS NOT NULL DO UPDATE SET
                name = excluded.name,
                kind = excluded.kind,
                trigger_barcodes = excluded.trigger_barcodes,
                reward_barcodes = excluded.reward_barcodes,
                min_quantity = excluded.min_quantity,
                max_quantity = excluded.max_quantity,
                reward_quantity = excluded.reward_quantity,
                discount_percent_bps = excluded.discount_percent_bps,
                set_discount_cents = excluded.set_discount_cents,
                after_discount_cents = excluded.after_discount_cents,
                set_price_cents = excluded.set_price_cents,
                is_active = excluded.is_active,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                rule_ref = excluded.rule_ref,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&rule.name)
        .bind(rule.kind)
        .bind(join_barcodes(&rule.trigger_barcodes))
        .bind(join_barcodes(&rule.reward_barcodes))
        .bind(rule.min_quantity)
        .bind(rule.max_quantity)
        .bind(rule.reward_quantity)
        .bind(rule.discount_percent_bps as i64)
        .bind(rule.set_discount_cents)
        .bind(rule.after_discount_cents)
        .bind(rule.set_price_cents)
        .bind(rule.is_active)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(program_ref)
        .bind(rule.rule_ref)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM loyalty_rules WHERE program_ref = ?1")
            .bind(program_ref)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    /// Toggles a loyalty rule.
    pub async fn set_loyalty_active(&self, id: i64, active: bool) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE loyalty_rules SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Loyalty rule", id.to_string()));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Promotions
    // -------------------------------------------------------------------------

    /// Lists active promotion rules, id ascending. Same window contract
    /// as [`Self::list_active_loyalty`].
    pub async fn list_active_promotions(&self) -> DbResult<Vec<PromotionRule>> {
        let rows: Vec<PromotionRow> = sqlx::query_as(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotion_rules WHERE is_active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PromotionRule::from).collect())
    }

    /// Inserts a promotion rule, returning its generated id.
    pub async fn insert_promotion(&self, rule: &PromotionRule) -> DbResult<i64> {
        debug!(name = %rule.name, "Inserting promotion rule");
        let (discount_type, discount_value) = discount_columns(&rule.discount);
        let (product_barcode, category) = scope_columns(&rule.scope);
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO promotion_rules (
                name, description, discount_type, discount_value,
                product_barcode, category, min_purchase_cents,
                max_discount_cents, is_active, start_date, end_date,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(discount_type)
        .bind(discount_value)
        .bind(product_barcode)
        .bind(category)
        .bind(rule.min_purchase_cents)
        .bind(rule.max_discount_cents)
        .bind(rule.is_active)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Toggles a promotion rule.
    pub async fn set_promotion_active(&self, id: i64, active: bool) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE promotion_rules SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion rule", id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
