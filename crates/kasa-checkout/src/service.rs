//! # Checkout Service
//!
//! The orchestration layer: sessions, the order pipeline, and the
//! per-session serialization that keeps running totals exact.
//!
//! ## Order Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_order, under the session lock               │
//! │                                                                         │
//! │  1. acquire per-session lock        ← one order at a time per session  │
//! │  2. load session, must be OPEN                                         │
//! │  3. resolve catalog + normalize cart (kasa-core)                       │
//! │  4. load active rules, snapshot the clock ONCE                         │
//! │  5. price_cart (kasa-core, pure)                                       │
//! │  6. resolve payment method (lenient: unknown → Cash + warning)         │
//! │  7. build order + lines + export payload, insert atomically            │
//! │     └── duplicate order number? regenerate once and retry              │
//! │  8. add the total to the session's running figures (sales only)        │
//! │                                                                         │
//! │  Different sessions proceed in parallel; only same-session orders      │
//! │  queue behind each other.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kasa_core::{
    normalize, price_cart, CartLine, CoreError, DiscountMode, Order, OrderLine, OrderStatus,
    OrderType, PaymentMethod, PosSession, PricedOrder,
};
use kasa_db::Database;

use crate::error::{CheckoutError, CheckoutResult};
use crate::export::order_export_json;

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// A checkout request, as the caller hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub session_id: i64,

    #[serde(default)]
    pub order_type: OrderType,

    pub lines: Vec<CartLine>,

    /// Free-text payment label ("cash", "CARD", "debit", ...). Parsed
    /// leniently; unknown labels fall back to Cash with a warning.
    #[serde(default)]
    pub payment_method: Option<String>,

    /// Who decides the discounts. Defaults to the engine.
    #[serde(default)]
    pub discount_mode: DiscountMode,

    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_vat: Option<String>,

    /// Returns: the order number being returned against.
    #[serde(default)]
    pub original_order_number: Option<String>,
    /// Returns: why.
    #[serde(default)]
    pub return_reason: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// A persisted order with its lines, as the pipeline hands it back.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Service
// =============================================================================

/// The checkout orchestrator.
///
/// Cheap to clone; clones share the database pool and the lock map, so
/// per-session serialization holds across every handle in the process.
#[derive(Clone)]
pub struct CheckoutService {
    db: Database,
    /// One async mutex per session id. Entries are created on demand and
    /// live for the process lifetime; a POS runs a handful of sessions.
    session_locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl CheckoutService {
    /// Creates a checkout service on top of an initialized database.
    pub fn new(db: Database) -> Self {
        CheckoutService {
            db,
            session_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The underlying database handle, for callers that need raw
    /// repository access (admin surfaces, seeding).
    pub fn db(&self) -> &Database {
        &self.db
    }

    async fn session_lock(&self, session_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks.entry(session_id).or_default().clone()
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Opens a session for a cashier, or returns their existing open one.
    ///
    /// Re-opening the POS after a crash must not strand a session with
    /// orders in it, so an existing OPEN session is always reused.
    pub async fn open_session(
        &self,
        cashier_name: &str,
        opening_cash_cents: i64,
    ) -> CheckoutResult<PosSession> {
        kasa_core::validation::validate_cashier_name(cashier_name).map_err(CoreError::from)?;
        kasa_core::validation::validate_opening_cash(opening_cash_cents)
            .map_err(CoreError::from)?;

        let sessions = self.db.sessions();

        if let Some(existing) = sessions.find_active_by_cashier(cashier_name).await? {
            info!(
                session_id = existing.id,
                cashier = %cashier_name,
                "Reusing existing open session"
            );
            return Ok(existing);
        }

        let session_number = sessions.next_session_number(cashier_name).await?;
        let id = sessions
            .insert(session_number, cashier_name, opening_cash_cents, Utc::now())
            .await?;

        info!(session_id = id, cashier = %cashier_name, session_number, "Session opened");

        sessions
            .get_by_id(id)
            .await?
            .ok_or(CheckoutError::SessionNotFound(id))
    }

    /// Closes a session, writing authoritative totals recomputed from
    /// its persisted COMPLETED orders.
    pub async fn close_session(
        &self,
        session_id: i64,
        closing_cash_cents: i64,
        notes: Option<&str>,
    ) -> CheckoutResult<PosSession> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let sessions = self.db.sessions();
        let session = sessions
            .get_by_id(session_id)
            .await?
            .ok_or(CheckoutError::SessionNotFound(session_id))?;
        if !session.is_open() {
            return Err(CheckoutError::SessionClosed(session_id));
        }

        let (total_cents, order_count) = sessions.completed_session_totals(session_id).await?;

        sessions
            .close(
                session_id,
                closing_cash_cents,
                total_cents,
                order_count,
                notes,
                Utc::now(),
            )
            .await?;

        info!(
            session_id,
            total_cents, order_count, "Session closed with recomputed totals"
        );

        sessions
            .get_by_id(session_id)
            .await?
            .ok_or(CheckoutError::SessionNotFound(session_id))
    }

    /// Gets a session by id.
    pub async fn get_session(&self, session_id: i64) -> CheckoutResult<PosSession> {
        self.db
            .sessions()
            .get_by_id(session_id)
            .await?
            .ok_or(CheckoutError::SessionNotFound(session_id))
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Runs the full checkout pipeline for one cart.
    pub async fn create_order(&self, request: CreateOrderRequest) -> CheckoutResult<CreatedOrder> {
        let lock = self.session_lock(request.session_id).await;
        let _guard = lock.lock().await;

        // Session must exist and be open. The guarded totals UPDATE
        // re-checks this, but failing early gives the caller the precise
        // error instead of a NotFound from deep in the pipeline.
        let session = self
            .db
            .sessions()
            .get_by_id(request.session_id)
            .await?
            .ok_or(CheckoutError::SessionNotFound(request.session_id))?;
        if !session.is_open() {
            return Err(CheckoutError::SessionClosed(session.id));
        }

        // Resolve and normalize the cart.
        let barcodes: Vec<String> = request.lines.iter().map(|l| l.barcode.clone()).collect();
        let catalog = self.db.products().catalog_for(&barcodes).await?;
        let cart = normalize(&request.lines, &catalog)?;

        // One clock snapshot for the whole pricing pass.
        let at = Utc::now();
        let (loyalty, promotions) = match request.discount_mode {
            DiscountMode::EngineComputed => (
                self.db.rules().list_active_loyalty().await?,
                self.db.rules().list_active_promotions().await?,
            ),
            DiscountMode::CallerSupplied => (Vec::new(), Vec::new()),
        };

        let priced = price_cart(
            &cart,
            &loyalty,
            &promotions,
            at,
            request.order_type,
            request.discount_mode,
        );

        let payment_method = resolve_payment_method(request.payment_method.as_deref());

        // Persist; one regenerate-and-retry on an order number collision.
        let mut order_number = generate_order_number(session.id);
        let mut retried = false;
        let (order, lines) = loop {
            let (mut order, mut lines) =
                build_order(&session, &request, &priced, &order_number, payment_method);
            match self.db.orders().insert_with_lines(&order, &lines).await {
                Ok(order_id) => {
                    order.id = order_id;
                    for line in &mut lines {
                        line.order_id = order_id;
                    }
                    break (order, lines);
                }
                Err(e) if e.is_unique_violation_on("order_number") && !retried => {
                    retried = true;
                    let retry = generate_order_number(session.id);
                    warn!(
                        old = %order_number,
                        new = %retry,
                        "Order number collision, retrying once"
                    );
                    order_number = retry;
                }
                Err(e) if e.is_unique_violation_on("order_number") => {
                    return Err(CheckoutError::OrderNumberCollision(order_number));
                }
                Err(e) => return Err(e.into()),
            }
        };

        // Running session figures count COMPLETED orders only; returns
        // (REFUNDED) are excluded here and at close, consistently.
        if order.status == OrderStatus::Completed {
            self.db
                .sessions()
                .add_order_total(session.id, order.total_cents)
                .await?;
        }

        info!(
            order_number = %order.order_number,
            session_id = session.id,
            total_cents = order.total_cents,
            lines = lines.len(),
            "Order created"
        );

        Ok(CreatedOrder { order, lines })
    }

    /// Gets an order and its lines by order number.
    pub async fn get_order(&self, order_number: &str) -> CheckoutResult<Option<CreatedOrder>> {
        let Some(order) = self.db.orders().get_by_order_number(order_number).await? else {
            return Ok(None);
        };
        let lines = self.db.orders().get_lines(order.id).await?;
        Ok(Some(CreatedOrder { order, lines }))
    }

    /// Lists every order of a session, newest first.
    pub async fn get_session_orders(&self, session_id: i64) -> CheckoutResult<Vec<Order>> {
        Ok(self.db.orders().list_by_session(session_id).await?)
    }

    /// Orders whose export payload has not shipped yet.
    pub async fn list_unsynced_orders(&self) -> CheckoutResult<Vec<Order>> {
        Ok(self.db.orders().list_unsynced().await?)
    }

    /// Marks an order's export payload as shipped (or un-ships it).
    pub async fn update_sync_status(
        &self,
        order_number: &str,
        synced: bool,
    ) -> CheckoutResult<()> {
        self.db
            .orders()
            .update_sync_status(order_number, synced)
            .await?;
        debug!(order_number, synced, "Sync status updated");
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Lenient payment parsing: unrecognized or missing labels become Cash.
/// A typo at the till must never block a sale.
fn resolve_payment_method(label: Option<&str>) -> PaymentMethod {
    match label {
        None => PaymentMethod::default(),
        Some(label) => PaymentMethod::from_label(label).unwrap_or_else(|| {
            warn!(label, "Unknown payment method label, falling back to Cash");
            PaymentMethod::Cash
        }),
    }
}

/// `ORD-{session}-{timestamp}-{nnnn}`, the disambiguator derived from
/// sub-second nanos so two orders within the same second differ.
fn generate_order_number(session_id: i64) -> String {
    let now = Utc::now();
    let nanos = now.timestamp_subsec_nanos();
    format!(
        "ORD-{}-{}-{:04}",
        session_id,
        now.format("%Y%m%d%H%M%S"),
        nanos % 10_000
    )
}

fn build_order(
    session: &PosSession,
    request: &CreateOrderRequest,
    priced: &PricedOrder,
    order_number: &str,
    payment_method: PaymentMethod,
) -> (Order, Vec<OrderLine>) {
    let now = Utc::now();

    let status = match request.order_type {
        OrderType::Sale => OrderStatus::Completed,
        OrderType::Return => OrderStatus::Refunded,
    };

    let lines: Vec<OrderLine> = priced
        .lines
        .iter()
        .map(|line| OrderLine {
            id: Uuid::new_v4().to_string(),
            order_id: 0, // stamped after insertion
            product_barcode: line.barcode.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            free_items: line.free_items,
            subtotal_cents: line.subtotal.cents(),
            discount_cents: line.discount.cents(),
            tax_rate_bps: line.tax_rate_bps,
            tax_cents: line.tax.cents(),
            total_cents: line.total.cents(),
            promotion_label: line.promotion_label.clone(),
            is_reward: line.is_reward,
            created_at: now,
        })
        .collect();

    let mut order = Order {
        id: 0, // stamped after insertion
        order_number: order_number.to_string(),
        order_type: request.order_type,
        session_id: session.id,
        cashier_name: session.cashier_name.clone(),
        status,
        subtotal_cents: priced.subtotal.cents(),
        discount_cents: priced.discount_total.cents(),
        tax_cents: priced.tax_total.cents(),
        total_cents: priced.total.cents(),
        payment_method,
        customer_name: request.customer_name.clone(),
        customer_phone: request.customer_phone.clone(),
        customer_vat: request.customer_vat.clone(),
        original_order_number: request.original_order_number.clone(),
        return_reason: request.return_reason.clone(),
        notes: request.notes.clone(),
        order_json: None,
        sync_status: false,
        created_at: now,
        updated_at: now,
    };
    order.order_json = Some(order_export_json(&order, &lines));

    (order, lines)
}

// =============================================================================
// Integration-Style Tests (in-memory database)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kasa_core::{LoyaltyKind, LoyaltyRule, Product, PromotionDiscount, PromotionRule, RuleScope};
    use kasa_db::DbConfig;

    async fn service() -> CheckoutService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        CheckoutService::new(db)
    }

    async fn seed_product(svc: &CheckoutService, barcode: &str, price_cents: i64, tax_bps: u32) {
        let now = Utc::now();
        svc.db()
            .products()
            .insert(&Product {
                id: 0,
                barcode: barcode.to_string(),
                name: format!("Product {barcode}"),
                description: None,
                price_cents,
                category: Some("drinks".to_string()),
                tax_rate_bps: tax_bps,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn request(session_id: i64, lines: Vec<CartLine>) -> CreateOrderRequest {
        CreateOrderRequest {
            session_id,
            order_type: OrderType::Sale,
            lines,
            payment_method: Some("cash".to_string()),
            discount_mode: DiscountMode::EngineComputed,
            customer_name: None,
            customer_phone: None,
            customer_vat: None,
            original_order_number: None,
            return_reason: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_full_checkout_flow() {
        let svc = service().await;
        seed_product(&svc, "1001", 1000, 800).await;

        svc.db()
            .rules()
            .insert_promotion(&PromotionRule {
                id: 0,
                name: "Drinks 10% Off".to_string(),
                description: None,
                discount: PromotionDiscount::Percentage(1000),
                scope: RuleScope::ByCategory("drinks".to_string()),
                min_purchase_cents: 0,
                max_discount_cents: None,
                is_active: true,
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();

        let session = svc.open_session("alice", 10_000).await.unwrap();
        let created = svc
            .create_order(request(session.id, vec![CartLine::new("1001", 1)]))
            .await
            .unwrap();

        // $10.00 − 10% = $9.00 taxable, 8% tax = $0.72
        assert_eq!(created.order.subtotal_cents, 1000);
        assert_eq!(created.order.discount_cents, 100);
        assert_eq!(created.order.tax_cents, 72);
        assert_eq!(created.order.total_cents, 972);
        assert_eq!(created.order.status, OrderStatus::Completed);
        assert!(created.order.order_json.is_some());
        assert_eq!(created.lines.len(), 1);
        assert_eq!(
            created.lines[0].promotion_label.as_deref(),
            Some("Drinks 10% Off (-$1.00)")
        );

        let session = svc.get_session(session.id).await.unwrap();
        assert_eq!(session.total_sales_cents, 972);
        assert_eq!(session.transaction_count, 1);
    }

    #[tokio::test]
    async fn test_bogo_grants_free_reward_units() {
        let svc = service().await;
        seed_product(&svc, "1001", 150, 0).await;
        seed_product(&svc, "1004", 120, 0).await;

        svc.db()
            .rules()
            .insert_loyalty(&LoyaltyRule {
                id: 0,
                name: "Buy 2 Get 1".to_string(),
                kind: LoyaltyKind::BuyXGetY,
                trigger_barcodes: vec!["1001".to_string()],
                reward_barcodes: vec!["1004".to_string()],
                min_quantity: 2,
                max_quantity: None,
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
            .await
            .unwrap();

        let session = svc.open_session("alice", 0).await.unwrap();
        let created = svc
            .create_order(request(
                session.id,
                vec![CartLine::new("1001", 2), CartLine::new("1004", 1)],
            ))
            .await
            .unwrap();

        let water = created
            .lines
            .iter()
            .find(|l| l.product_barcode == "1004")
            .unwrap();
        assert_eq!(water.free_items, 1);
        assert_eq!(water.discount_cents, 120);
        assert_eq!(water.total_cents, 0);
        // 2 × $1.50 colas + free water
        assert_eq!(created.order.total_cents, 300);
    }

    #[tokio::test]
    async fn test_concurrent_orders_same_session() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;
        seed_product(&svc, "B", 750, 0).await;

        let session = svc.open_session("alice", 0).await.unwrap();

        let svc_a = svc.clone();
        let svc_b = svc.clone();
        let id = session.id;
        let (a, b) = tokio::join!(
            svc_a.create_order(request(id, vec![CartLine::new("A", 1)])),
            svc_b.create_order(request(id, vec![CartLine::new("B", 1)])),
        );
        let a = a.unwrap();
        let b = b.unwrap();
        assert_ne!(a.order.order_number, b.order.order_number);

        let session = svc.get_session(id).await.unwrap();
        assert_eq!(session.total_sales_cents, 1250);
        assert_eq!(session.transaction_count, 2);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_orders() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;

        let session = svc.open_session("alice", 0).await.unwrap();
        svc.close_session(session.id, 0, None).await.unwrap();

        let err = svc
            .create_order(request(session.id, vec![CartLine::new("A", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SessionClosed(_)));

        let err = svc.close_session(session.id, 0, None).await.unwrap_err();
        assert!(matches!(err, CheckoutError::SessionClosed(_)));
    }

    #[tokio::test]
    async fn test_unknown_product_rejects_whole_cart() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;
        let session = svc.open_session("alice", 0).await.unwrap();

        let err = svc
            .create_order(request(
                session.id,
                vec![CartLine::new("A", 1), CartLine::new("ghost", 1)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::UnknownProduct(ref b)) if b == "ghost"
        ));

        // Nothing persisted, nothing counted.
        assert!(svc.get_session_orders(session.id).await.unwrap().is_empty());
        let session = svc.get_session(session.id).await.unwrap();
        assert_eq!(session.transaction_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_payment_label_falls_back_to_cash() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;
        let session = svc.open_session("alice", 0).await.unwrap();

        let mut req = request(session.id, vec![CartLine::new("A", 1)]);
        req.payment_method = Some("bitcoin".to_string());
        let created = svc.create_order(req).await.unwrap();
        assert_eq!(created.order.payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_return_order_is_refunded_and_excluded_from_totals() {
        let svc = service().await;
        seed_product(&svc, "A", 1000, 800).await;
        let session = svc.open_session("alice", 0).await.unwrap();

        let sale = svc
            .create_order(request(session.id, vec![CartLine::new("A", 1)]))
            .await
            .unwrap();

        let mut ret = request(session.id, vec![CartLine::new("A", 1)]);
        ret.order_type = OrderType::Return;
        ret.original_order_number = Some(sale.order.order_number.clone());
        ret.return_reason = Some("damaged".to_string());
        let ret = svc.create_order(ret).await.unwrap();

        assert_eq!(ret.order.status, OrderStatus::Refunded);
        assert_eq!(ret.order.total_cents, -sale.order.total_cents);
        assert_eq!(ret.lines[0].quantity, -1);

        // Running figures only count COMPLETED orders.
        let session = svc.get_session(session.id).await.unwrap();
        assert_eq!(session.total_sales_cents, sale.order.total_cents);
        assert_eq!(session.transaction_count, 1);
    }

    #[tokio::test]
    async fn test_close_recomputes_from_completed_orders() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;
        seed_product(&svc, "B", 750, 0).await;

        let session = svc.open_session("alice", 10_000).await.unwrap();
        svc.create_order(request(session.id, vec![CartLine::new("A", 1)]))
            .await
            .unwrap();
        svc.create_order(request(session.id, vec![CartLine::new("B", 2)]))
            .await
            .unwrap();

        let closed = svc
            .close_session(session.id, 12_000, Some("even"))
            .await
            .unwrap();
        assert_eq!(closed.total_sales_cents, 2000);
        assert_eq!(closed.transaction_count, 2);
        assert_eq!(closed.closing_cash_cents, Some(12_000));
        assert!(!closed.is_open());
    }

    #[tokio::test]
    async fn test_open_session_reuses_existing() {
        let svc = service().await;

        let first = svc.open_session("alice", 5_000).await.unwrap();
        let second = svc.open_session("alice", 9_999).await.unwrap();
        assert_eq!(first.id, second.id);
        // The original opening float stands.
        assert_eq!(second.opening_cash_cents, 5_000);

        // A different cashier gets a fresh session with its own sequence.
        let bob = svc.open_session("bob", 0).await.unwrap();
        assert_ne!(bob.id, first.id);
        assert_eq!(bob.session_number, 1);
    }

    #[tokio::test]
    async fn test_caller_supplied_discounts_skip_rules() {
        let svc = service().await;
        seed_product(&svc, "A", 1000, 0).await;

        // A storewide 50% promotion exists but must be ignored.
        svc.db()
            .rules()
            .insert_promotion(&PromotionRule {
                id: 0,
                name: "Half Off".to_string(),
                description: None,
                discount: PromotionDiscount::Percentage(5000),
                scope: RuleScope::Unscoped,
                min_purchase_cents: 0,
                max_discount_cents: None,
                is_active: true,
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();

        let session = svc.open_session("alice", 0).await.unwrap();
        let mut line = CartLine::new("A", 1);
        line.discount_cents = Some(300);
        line.promotion_name = Some("Manager override".to_string());

        let mut req = request(session.id, vec![line]);
        req.discount_mode = DiscountMode::CallerSupplied;
        let created = svc.create_order(req).await.unwrap();

        assert_eq!(created.order.discount_cents, 300);
        assert_eq!(created.order.total_cents, 700);
        assert_eq!(
            created.lines[0].promotion_label.as_deref(),
            Some("Manager override")
        );
    }

    #[tokio::test]
    async fn test_sync_status_lifecycle() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;
        let session = svc.open_session("alice", 0).await.unwrap();

        let created = svc
            .create_order(request(session.id, vec![CartLine::new("A", 1)]))
            .await
            .unwrap();

        let unsynced = svc.list_unsynced_orders().await.unwrap();
        assert_eq!(unsynced.len(), 1);

        svc.update_sync_status(&created.order.order_number, true)
            .await
            .unwrap();
        assert!(svc.list_unsynced_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_order_round_trip() {
        let svc = service().await;
        seed_product(&svc, "A", 500, 0).await;
        let session = svc.open_session("alice", 0).await.unwrap();

        let created = svc
            .create_order(request(session.id, vec![CartLine::new("A", 3)]))
            .await
            .unwrap();

        let fetched = svc
            .get_order(&created.order.order_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.order.id, created.order.id);
        assert_eq!(fetched.lines.len(), 1);
        assert_eq!(fetched.lines[0].quantity, 3);

        assert!(svc.get_order("ORD-404").await.unwrap().is_none());
    }
}
