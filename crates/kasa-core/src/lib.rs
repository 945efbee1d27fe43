//! # kasa-core: Pure Pricing Logic for Kasa POS
//!
//! This crate is the **heart** of Kasa POS. It contains all pricing and
//! promotion logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasa POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  kasa-checkout (Orchestration)                  │   │
//! │  │    open session ──► create order ──► close session              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasa-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   cart    │  │   rules   │  │  pricing  │  │   │
//! │  │   │   Money   │  │ normalize │  │  loyalty  │  │  matcher  │  │   │
//! │  │   │  TaxCalc  │  │   merge   │  │ promotion │  │  pricer   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasa-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, Order, OrderLine, PosSession, etc.)
//! - [`rules`] - Loyalty and promotion rule shapes and applicability windows
//! - [`cart`] - Cart line normalization (merge, validate, resolve)
//! - [`pricing`] - The matcher and the line pricer
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart + same rule snapshot = same priced order
//! 2. **No I/O**: database, network, file system AND the ambient clock are
//!    forbidden here; the snapshot instant is always a parameter
//! 3. **Integer Money**: all monetary values are cents (i64), rates are
//!    basis points; no floating point anywhere
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use kasa_core::money::Money;
//! use kasa_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let taxable = Money::from_cents(900); // $9.00 after discounts
//!
//! // Tax is computed AFTER discounts, half-up to the cent
//! let tax = taxable.calculate_tax(TaxRate::from_bps(800)); // 8%
//! assert_eq!(tax.cents(), 72);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kasa_core::Money` instead of
// `use kasa_core::money::Money`

pub use cart::{normalize, CartLine, NormalizedCart};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use pricing::{match_rules, price_cart, DiscountMode, PricedLine, PricedOrder};
pub use rules::{LoyaltyKind, LoyaltyRule, PromotionDiscount, PromotionRule, RuleScope};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart after merging.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a single pricing pass bounded.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum length of product and rule names.
pub const MAX_NAME_LEN: usize = 200;
