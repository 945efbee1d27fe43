//! # Domain Types
//!
//! Core domain types for the Kasa POS checkout backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   PosSession    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode (key)  │   │  order_number   │   │  cashier_name   │       │
//! │  │  price_cents    │   │  order_type     │   │  total_sales    │       │
//! │  │  tax_rate_bps   │   │  totals         │   │  txn_count      │       │
//! │  │  category       │   │  lines (1..N)   │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Enums: OrderType, OrderStatus, PaymentMethod, SessionStatus           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rule types (`LoyaltyRule`, `PromotionRule`) live in [`crate::rules`].
//!
//! Stored as SCREAMING_SNAKE_CASE strings in the database, matching the
//! sqlx `rename_all` on each enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so a tax rate of 0.08 is 800 bps.
/// Integer bps keep the engine free of floating point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product, resolved by barcode.
///
/// Immutable for the duration of one pricing pass; order lines snapshot
/// the fields they need so later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Database identifier.
    pub id: i64,

    /// Barcode - the business key the cart references.
    pub barcode: String,

    /// Display name shown to the cashier and on the order line.
    pub name: String,

    /// Optional longer description.
    pub description: Option<String>,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Category used for promotion scoping (None = uncategorized).
    pub category: Option<String>,

    /// Tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,

    /// Whether the product can be sold (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Order Enums
// =============================================================================

/// Whether the order adds to or subtracts from the session's sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Sale,
    Return,
}

impl OrderType {
    /// Sign applied to every monetary line field after the unsigned
    /// pricing pass: +1 for sales, -1 for returns.
    #[inline]
    pub const fn sign(&self) -> i64 {
        match self {
            OrderType::Sale => 1,
            OrderType::Return => -1,
        }
    }
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::Sale
    }
}

/// Lifecycle status of an order.
///
/// Orders are created already COMPLETED (the POS prices and persists in
/// one step); returns are created REFUNDED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Completed
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Other,
}

impl PaymentMethod {
    /// Parses a payment-method label; `None` for anything unrecognized.
    ///
    /// The checkout layer decides the fallback for `None` (it falls back
    /// to Cash and logs a warning, per the lenient boundary contract).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "CASH" => Some(PaymentMethod::Cash),
            "CARD" | "CREDIT" | "DEBIT" => Some(PaymentMethod::Card),
            "OTHER" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Order & OrderLine
// =============================================================================

/// A priced, taxed, totaled order.
///
/// Created atomically with its lines and immutable afterwards, except for
/// `sync_status` which belongs to the external sync collaborator.
///
/// ## Core Invariant
/// `subtotal_cents - discount_cents + tax_cents == total_cents`, exactly,
/// at both order and line granularity. Order fields are the exact sums of
/// line fields, never independently recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,

    /// Unique human-readable order number (`ORD-{session}-{ts}-{nnnn}`).
    pub order_number: String,

    pub order_type: OrderType,

    /// Owning session.
    pub session_id: i64,

    /// Cashier snapshot from the session at creation time.
    pub cashier_name: String,

    pub status: OrderStatus,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub payment_method: PaymentMethod,

    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_vat: Option<String>,

    /// For returns: the order number being returned against.
    pub original_order_number: Option<String>,
    /// For returns: why.
    pub return_reason: Option<String>,

    pub notes: Option<String>,

    /// Export payload for the downstream sync collaborator.
    pub order_json: Option<String>,

    /// Owned by the sync collaborator; false until exported downstream.
    pub sync_status: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One line of an order. Snapshot pattern: product name and unit price
/// are frozen at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// UUID v4.
    pub id: String,

    pub order_id: i64,

    pub product_barcode: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Signed: negative for returns.
    pub quantity: i64,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Units granted free by BUY_X_GET_Y rules.
    pub free_items: i64,

    /// Line subtotal before discounts (signed like quantity).
    pub subtotal_cents: i64,

    /// Sum of all stacked discounts on this line (signed).
    pub discount_cents: i64,

    /// Tax rate snapshot in basis points.
    pub tax_rate_bps: u32,

    /// Tax on the discounted base (signed).
    pub tax_cents: i64,

    /// subtotal - discount + tax (signed).
    pub total_cents: i64,

    /// Audit trail of the rules that fired, comma-joined in evaluation
    /// order ("Buy 2 Get 1 (1 free), Summer Sale (-$1.00)").
    pub promotion_label: Option<String>,

    /// Caller-flagged reward line (free item sent as its own line).
    pub is_reward: bool,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// PosSession
// =============================================================================

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// A cashier's working session.
///
/// ## Dual Aggregation Strategy
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Hot path (per order):   total_sales += order.total; txn_count += 1    │
/// │                          (one guarded UPDATE, O(1) per order)          │
/// │                                                                         │
/// │  Session close:          recompute both from persisted COMPLETED       │
/// │                          orders — authoritative, overrides the         │
/// │                          running counters                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSession {
    pub id: i64,

    /// Per-cashier sequence number (1, 2, 3, ...).
    pub session_number: i64,

    pub cashier_name: String,

    pub opening_cash_cents: i64,
    pub closing_cash_cents: Option<i64>,

    /// Running sales figure, incremented once per order.
    pub total_sales_cents: i64,

    /// Running transaction count, incremented once per order.
    pub transaction_count: i64,

    pub status: SessionStatus,

    pub notes: Option<String>,

    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl PosSession {
    /// An order may only be created against an OPEN session.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open && self.closed_at.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
