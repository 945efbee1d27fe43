//! # Cart Normalizer
//!
//! Collapses raw (barcode, quantity) line requests into a normalized
//! cart with products resolved.
//!
//! ## Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Normalization                                   │
//! │                                                                         │
//! │  Request lines            Normalized cart                              │
//! │  ─────────────            ───────────────                              │
//! │  ("001", 2)               "001" → qty 5, Product{...}   (2 + 3 merged) │
//! │  ("012", 1)     ──────►   "012" → qty 1, Product{...}                  │
//! │  ("001", 3)                                                            │
//! │                           order of first appearance preserved          │
//! │                                                                         │
//! │  Unknown or inactive barcode → CoreError::UnknownProduct (whole cart   │
//! │  rejected, no partial result)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Side-effect free: the catalog arrives as an already-loaded map, so the
//! normalizer never performs I/O and the same inputs always produce the
//! same cart.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Product;
use crate::validation::{validate_barcode, validate_quantity};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line (request side)
// =============================================================================

/// One requested cart line, as received from the caller.
///
/// The optional fields are the caller-supplied discount mode: a frontend
/// that already ran its own promotion pass sends the discount and label
/// along, and the engine stores them verbatim instead of recomputing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub barcode: String,

    /// Requested quantity, always positive. Return sign is applied by
    /// the line pricer.
    pub quantity: i64,

    /// Caller-precomputed discount for this line, in cents.
    #[serde(default)]
    pub discount_cents: Option<i64>,

    /// Caller-supplied promotion label.
    #[serde(default)]
    pub promotion_name: Option<String>,

    /// Caller-flagged reward line (free item sent as its own line).
    #[serde(default)]
    pub is_reward: bool,
}

impl CartLine {
    /// Plain sale line with no overrides.
    pub fn new(barcode: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            barcode: barcode.into(),
            quantity,
            discount_cents: None,
            promotion_name: None,
            is_reward: false,
        }
    }
}

// =============================================================================
// Normalized Cart
// =============================================================================

/// One normalized entry: a resolved product with the total requested
/// quantity and any merged caller overrides.
#[derive(Debug, Clone)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: i64,

    /// Sum of caller-supplied discounts across merged lines (None if no
    /// line supplied one).
    pub supplied_discount_cents: Option<i64>,
    /// First caller-supplied promotion label, if any.
    pub supplied_promotion: Option<String>,
    /// True if any merged line was flagged as a reward.
    pub is_reward: bool,
}

/// The normalizer's output: entries in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCart {
    entries: Vec<CartEntry>,
}

impl NormalizedCart {
    /// All entries, order-preserving.
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Total requested quantity of a barcode, or None if absent.
    ///
    /// Used by the promotion matcher to count trigger units.
    pub fn quantity_of(&self, barcode: &str) -> Option<i64> {
        self.entry_of(barcode).map(|e| e.quantity)
    }

    /// The entry for a barcode, or None if absent.
    pub fn entry_of(&self, barcode: &str) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.product.barcode == barcode)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes request lines against a preloaded catalog.
///
/// ## Failure Modes
/// - `EmptyCart` — no lines
/// - `CartTooLarge` — more distinct barcodes than `MAX_CART_LINES`
/// - `Validation` — bad barcode format or non-positive quantity
/// - `UnknownProduct` — barcode missing from the catalog, or resolving
///   to an inactive product
pub fn normalize(
    lines: &[CartLine],
    catalog: &HashMap<String, Product>,
) -> CoreResult<NormalizedCart> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut cart = NormalizedCart::default();

    for line in lines {
        validate_barcode(&line.barcode)?;
        validate_quantity(line.quantity)?;

        let barcode = line.barcode.trim();

        if let Some(entry) = cart
            .entries
            .iter_mut()
            .find(|e| e.product.barcode == barcode)
        {
            entry.quantity += line.quantity;
            if let Some(extra) = line.discount_cents {
                entry.supplied_discount_cents =
                    Some(entry.supplied_discount_cents.unwrap_or(0) + extra);
            }
            if entry.supplied_promotion.is_none() {
                entry.supplied_promotion = line.promotion_name.clone();
            }
            entry.is_reward |= line.is_reward;
            continue;
        }

        let product = catalog
            .get(barcode)
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::UnknownProduct(barcode.to_string()))?;

        if cart.entries.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        cart.entries.push(CartEntry {
            product: product.clone(),
            quantity: line.quantity,
            supplied_discount_cents: line.discount_cents,
            supplied_promotion: line.promotion_name.clone(),
            is_reward: line.is_reward,
        });
    }

    Ok(cart)
}

// =============================================================================
// Unit Tests
// =============================================================================
