//! # Promotional Rules
//!
//! The two rule families the promotion matcher evaluates.
//!
//! ## One Shape Per Family
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Rule Families                                     │
//! │                                                                         │
//! │  LoyaltyRule (trigger/reward barcode lists)                            │
//! │  ├── kind = BuyXGetY   → free units, scaled by complete trigger sets   │
//! │  └── kind = Discount   → percentage OR fixed per-set amount            │
//! │        (the "buy N for $M" import sets set_discount_cents)             │
//! │                                                                         │
//! │  PromotionRule (scoped discounts)                                      │
//! │  ├── scope = ByBarcode | ByCategory | Unscoped                         │
//! │  └── discount = Percentage(bps) | FixedAmount(cents)                   │
//! │                                                                         │
//! │  Both: active flag + [start_date, end_date] window, judged against    │
//! │  ONE snapshot instant per pricing pass.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loyalty shape deliberately unifies several historically
//! incompatible schemas (fixed BOGO fields, trigger/reward lists, imported
//! fixed-set pricing) behind a single kind tag with kind-specific
//! parameters, so the matcher has exactly one interface to evaluate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Time Window
// =============================================================================

/// Shared applicability predicate: active AND inside the inclusive
/// [start, end] window. A `None` bound is unbounded on that side.
///
/// Callers must evaluate every rule in one pricing pass against the same
/// snapshot instant, otherwise an order can straddle a rule boundary.
fn window_contains(
    is_active: bool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) -> bool {
    if !is_active {
        return false;
    }
    if let Some(start) = start {
        if at < start {
            return false;
        }
    }
    if let Some(end) = end {
        if at > end {
            return false;
        }
    }
    true
}

// =============================================================================
// Loyalty Rules
// =============================================================================

/// The two loyalty behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyKind {
    /// Money off the reward products (percentage or fixed per-set).
    Discount,
    /// Free reward units per complete trigger set.
    BuyXGetY,
}

/// A loyalty program rule.
///
/// ## Field Semantics By Kind
/// - `BuyXGetY`: `min_quantity` trigger units form one set;
///   `reward_quantity` free units are granted per set; `max_quantity`
///   caps the number of sets considered (None = uncapped).
/// - `Discount` with `set_discount_cents`: "buy N for $M" — the discount
///   is a precomputed amount per complete set of `min_quantity` units.
/// - `Discount` without `set_discount_cents`: `discount_percent_bps` off
///   the reward line's subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyRule {
    pub id: i64,
    pub name: String,
    pub kind: LoyaltyKind,

    /// Barcodes whose presence activates the rule (non-empty).
    pub trigger_barcodes: Vec<String>,
    /// Barcodes eligible for the benefit. Equals the trigger set in the
    /// "eligible products" variant.
    pub reward_barcodes: Vec<String>,

    /// Size of one trigger set (>= 1).
    pub min_quantity: i64,
    /// Cap on sets considered. None = unlimited sets.
    pub max_quantity: Option<i64>,
    /// Free units granted per set (BuyXGetY).
    pub reward_quantity: i64,

    /// Percentage off in basis points (Discount without a fixed amount).
    pub discount_percent_bps: u32,
    /// Fixed discount per complete set, in cents (the "buy N for $M" form).
    pub set_discount_cents: Option<i64>,
    /// Informational: set price after discount (import reconciliation).
    pub after_discount_cents: Option<i64>,
    /// Informational: unit price before discount (import reconciliation).
    pub set_price_cents: Option<i64>,

    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    /// External program identifier, used only for upstream reconciliation.
    pub program_ref: Option<i64>,
    /// External rule identifier, used only for upstream reconciliation.
    pub rule_ref: Option<i64>,
}

impl LoyaltyRule {
    /// True iff this rule may fire at instant `at`.
    pub fn applies_at(&self, at: DateTime<Utc>) -> bool {
        window_contains(self.is_active, self.start_date, self.end_date, at)
    }

    /// Caps a raw set count by `max_quantity`, if configured.
    pub fn cap_sets(&self, sets: i64) -> i64 {
        match self.max_quantity {
            Some(max) => sets.min(max),
            None => sets,
        }
    }
}

// =============================================================================
// Promotion Rules
// =============================================================================

/// What a promotion takes off the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionDiscount {
    /// Percentage off in basis points (1000 = 10%).
    Percentage(u32),
    /// Flat amount off in cents.
    FixedAmount(i64),
}

/// Which lines a promotion touches.
///
/// Modeled as an explicit variant instead of two nullable fields: the
/// original "barcode OR category OR (both null = everything)" inference
/// is exactly the kind of scoping logic that goes subtly wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "target", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleScope {
    /// Exactly one product.
    ByBarcode(String),
    /// Every product in a category.
    ByCategory(String),
    /// Every product.
    Unscoped,
}

impl RuleScope {
    /// Does this scope cover the given product?
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            RuleScope::ByBarcode(barcode) => product.barcode == *barcode,
            RuleScope::ByCategory(category) => {
                product.category.as_deref() == Some(category.as_str())
            }
            RuleScope::Unscoped => true,
        }
    }
}

/// A storewide promotion rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRule {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,

    pub discount: PromotionDiscount,
    pub scope: RuleScope,

    /// Minimum line subtotal (cents) before the promotion applies.
    pub min_purchase_cents: i64,
    /// Cap on the computed discount, in cents. None = uncapped.
    pub max_discount_cents: Option<i64>,

    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl PromotionRule {
    /// True iff this rule may fire at instant `at`.
    pub fn applies_at(&self, at: DateTime<Utc>) -> bool {
        window_contains(self.is_active, self.start_date, self.end_date, at)
    }

    /// Computes the raw discount for a line subtotal, before the
    /// `max_discount_cents` cap.
    pub fn discount_for(&self, line_subtotal: Money) -> Money {
        match self.discount {
            PromotionDiscount::Percentage(bps) => line_subtotal.percentage(bps),
            PromotionDiscount::FixedAmount(cents) => Money::from_cents(cents),
        }
    }

    /// Applies the `max_discount_cents` cap, if configured.
    pub fn cap_discount(&self, discount: Money) -> Money {
        match self.max_discount_cents {
            Some(cap) => discount.clamp(Money::zero(), Money::from_cents(cap)),
            None => discount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(barcode: &str, category: Option<&str>) -> Product {
        Product {
            id: 1,
            barcode: barcode.to_string(),
            name: format!("Product {barcode}"),
            description: None,
            price_cents: 1000,
            category: category.map(str::to_string),
            tax_rate_bps: 800,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn rule_with_window(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        active: bool,
    ) -> PromotionRule {
        PromotionRule {
            id: 1,
            name: "Test".to_string(),
            description: None,
            discount: PromotionDiscount::Percentage(1000),
            scope: RuleScope::Unscoped,
            min_purchase_cents: 0,
            max_discount_cents: None,
            is_active: active,
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_window_inclusive_bounds() {
        let rule = rule_with_window(Some(at(2026, 1, 1)), Some(at(2026, 1, 31)), true);

        assert!(rule.applies_at(at(2026, 1, 1))); // start inclusive
        assert!(rule.applies_at(at(2026, 1, 15)));
        assert!(rule.applies_at(at(2026, 1, 31))); // end inclusive
        assert!(!rule.applies_at(at(2025, 12, 31)));
        assert!(!rule.applies_at(at(2026, 2, 1)));
    }

    #[test]
    fn test_window_unbounded_sides() {
        let open_start = rule_with_window(None, Some(at(2026, 6, 1)), true);
        assert!(open_start.applies_at(at(2000, 1, 1)));
        assert!(!open_start.applies_at(at(2026, 7, 1)));

        let open_end = rule_with_window(Some(at(2026, 6, 1)), None, true);
        assert!(open_end.applies_at(at(2030, 1, 1)));
        assert!(!open_end.applies_at(at(2026, 5, 1)));
    }

    #[test]
    fn test_inactive_rule_never_applies() {
        let rule = rule_with_window(None, None, false);
        assert!(!rule.applies_at(at(2026, 1, 15)));
    }

    #[test]
    fn test_scope_matching() {
        let soda = product("001", Some("drinks"));
        let chips = product("002", Some("snacks"));
        let uncategorized = product("003", None);

        assert!(RuleScope::ByBarcode("001".to_string()).matches(&soda));
        assert!(!RuleScope::ByBarcode("001".to_string()).matches(&chips));

        let drinks = RuleScope::ByCategory("drinks".to_string());
        assert!(drinks.matches(&soda));
        assert!(!drinks.matches(&chips));
        assert!(!drinks.matches(&uncategorized));

        assert!(RuleScope::Unscoped.matches(&soda));
        assert!(RuleScope::Unscoped.matches(&uncategorized));
    }

    #[test]
    fn test_promotion_discount_and_cap() {
        let mut rule = rule_with_window(None, None, true);
        // 10% of $20.00 = $2.00
        assert_eq!(
            rule.discount_for(Money::from_cents(2000)).cents(),
            200
        );

        rule.max_discount_cents = Some(150);
        let capped = rule.cap_discount(rule.discount_for(Money::from_cents(2000)));
        assert_eq!(capped.cents(), 150);

        rule.discount = PromotionDiscount::FixedAmount(500);
        assert_eq!(rule.discount_for(Money::from_cents(2000)).cents(), 500);
    }

    #[test]
    fn test_loyalty_set_cap() {
        let rule = LoyaltyRule {
            id: 1,
            name: "B2G1".to_string(),
            kind: LoyaltyKind::BuyXGetY,
            trigger_barcodes: vec!["001".to_string()],
            reward_barcodes: vec!["001".to_string()],
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
        };
        assert_eq!(rule.cap_sets(5), 3);
        assert_eq!(rule.cap_sets(2), 2);
    }
}
