//! # Promotion Matcher
//!
//! Decides, for the whole cart, how many free units and how much discount
//! each product line receives — before any tax is computed.
//!
//! ## Matching Pass
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Matching Pass                                    │
//! │                                                                         │
//! │  inputs: normalized cart + active rule snapshot + ONE instant          │
//! │                                                                         │
//! │  1. Loyalty rules, id ascending                                        │
//! │     ├── BuyXGetY  → free-unit grants per reward barcode                │
//! │     └── Discount  → fixed per-set or percentage amounts                │
//! │                                                                         │
//! │  2. Promotion rules, id ascending                                      │
//! │     └── scope match → min-purchase gate → amount → max-discount cap    │
//! │                                                                         │
//! │  output: per-barcode { free_items, discount, audit labels }            │
//! │                                                                         │
//! │  STACKING IS ADDITIVE. Every matching rule contributes; nothing is     │
//! │  exclusive. The line pricer clamps the sum at the line subtotal.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//! Rules are evaluated in ascending id order within each family, loyalty
//! before promotions. Same cart + same snapshot ⇒ identical discounts and
//! identical audit labels, which downstream reconciliation relies on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::cart::NormalizedCart;
use crate::money::Money;
use crate::rules::{LoyaltyKind, LoyaltyRule, PromotionRule};

// =============================================================================
// Match Outcome
// =============================================================================

/// Accumulated effects for one product line.
#[derive(Debug, Clone, Default)]
pub struct LineEffect {
    /// Free units granted by BUY_X_GET_Y rules (accumulates across rules,
    /// already capped at the cart quantity of the barcode).
    pub free_items: i64,

    /// Sum of all discount amounts from Discount-kind loyalty rules and
    /// promotion rules. Does NOT include the monetary value of free
    /// units; the line pricer converts those.
    pub discount: Money,

    /// One audit entry per rule that contributed a non-zero effect, in
    /// evaluation order: "rule name (effect)".
    pub labels: Vec<String>,
}

/// Per-barcode effects for the whole cart.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    effects: HashMap<String, LineEffect>,
}

impl MatchOutcome {
    /// The accumulated effect for a barcode, if any rule touched it.
    pub fn effect(&self, barcode: &str) -> Option<&LineEffect> {
        self.effects.get(barcode)
    }

    fn effect_mut(&mut self, barcode: &str) -> &mut LineEffect {
        self.effects.entry(barcode.to_string()).or_default()
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Runs the full matching pass.
///
/// `at` is the single snapshot instant for the pass: every rule's
/// validity window is judged against it, so an order can never straddle
/// a rule boundary.
pub fn match_rules(
    cart: &NormalizedCart,
    loyalty: &[LoyaltyRule],
    promotions: &[PromotionRule],
    at: DateTime<Utc>,
) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    let mut loyalty: Vec<&LoyaltyRule> = loyalty.iter().filter(|r| r.applies_at(at)).collect();
    loyalty.sort_by_key(|r| r.id);

    for rule in loyalty {
        match rule.kind {
            LoyaltyKind::BuyXGetY => apply_buy_x_get_y(cart, rule, &mut outcome),
            LoyaltyKind::Discount => apply_loyalty_discount(cart, rule, &mut outcome),
        }
    }

    let mut promotions: Vec<&PromotionRule> =
        promotions.iter().filter(|r| r.applies_at(at)).collect();
    promotions.sort_by_key(|r| r.id);

    for rule in promotions {
        apply_promotion(cart, rule, &mut outcome);
    }

    outcome
}

/// BUY_X_GET_Y: count complete trigger sets, then grant free reward units.
///
/// Set count is the MINIMUM of `floor(qty / min_quantity)` across trigger
/// barcodes that are present and meet the threshold — conservative when a
/// rule lists several triggers that must travel together. The grant per
/// reward barcode is capped at what was actually purchased: a customer
/// cannot receive more free units than units in the cart.
fn apply_buy_x_get_y(cart: &NormalizedCart, rule: &LoyaltyRule, outcome: &mut MatchOutcome) {
    if rule.min_quantity < 1 || rule.reward_quantity < 1 {
        return;
    }

    let mut sets: Option<i64> = None;
    for trigger in &rule.trigger_barcodes {
        if let Some(qty) = cart.quantity_of(trigger) {
            if qty >= rule.min_quantity {
                let s = qty / rule.min_quantity;
                sets = Some(sets.map_or(s, |cur| cur.min(s)));
            }
        }
    }

    let sets = rule.cap_sets(sets.unwrap_or(0));
    if sets == 0 {
        return;
    }

    for reward in &rule.reward_barcodes {
        if let Some(qty) = cart.quantity_of(reward) {
            let free = (sets * rule.reward_quantity).min(qty);
            if free > 0 {
                let effect = outcome.effect_mut(reward);
                effect.free_items += free;
                effect.labels.push(format!("{} ({} free)", rule.name, free));
            }
        }
    }
}

/// Discount-kind loyalty: fixed per-set amount ("buy N for $M") when
/// `set_discount_cents` is present, percentage of the line subtotal
/// otherwise. Either way the reward barcode must be in the cart with at
/// least one complete set worth of units.
fn apply_loyalty_discount(cart: &NormalizedCart, rule: &LoyaltyRule, outcome: &mut MatchOutcome) {
    if rule.min_quantity < 1 {
        return;
    }

    for reward in &rule.reward_barcodes {
        let Some(entry) = cart.entry_of(reward) else {
            continue;
        };
        if entry.quantity < rule.min_quantity {
            continue;
        }

        let discount = match rule.set_discount_cents {
            Some(per_set) => {
                let sets = rule.cap_sets(entry.quantity / rule.min_quantity);
                Money::from_cents(per_set) * sets
            }
            None => {
                let subtotal = entry.product.price() * entry.quantity;
                subtotal.percentage(rule.discount_percent_bps)
            }
        };

        if discount.is_positive() {
            let effect = outcome.effect_mut(reward);
            effect.discount += discount;
            effect.labels.push(format!("{} (-{})", rule.name, discount));
        }
    }
}

/// Promotion rules: resolve scope against each line's product, gate on
/// the line subtotal, compute the amount, truncate by the per-rule cap.
fn apply_promotion(cart: &NormalizedCart, rule: &PromotionRule, outcome: &mut MatchOutcome) {
    for entry in cart.entries() {
        if !rule.scope.matches(&entry.product) {
            continue;
        }

        let subtotal = entry.product.price() * entry.quantity;
        if subtotal.cents() < rule.min_purchase_cents {
            continue;
        }

        let discount = rule.cap_discount(rule.discount_for(subtotal));
        if discount.is_positive() {
            let effect = outcome.effect_mut(&entry.product.barcode);
            effect.discount += discount;
            effect.labels.push(format!("{} (-{})", rule.name, discount));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
