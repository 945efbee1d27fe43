//! # Line Pricer
//!
//! Turns a normalized cart plus matcher effects into fully-priced lines
//! and order totals.
//!
//! ## Per-Line Arithmetic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Pricing One Line (always on positive units)             │
//! │                                                                         │
//! │  subtotal = unit_price × quantity                                      │
//! │  discount = (free_items × unit_price) + matched discounts              │
//! │             clamped to [0, subtotal]        ← a line never goes        │
//! │                                               negative                  │
//! │  taxable  = subtotal − discount             ← tax AFTER discounts      │
//! │  tax      = taxable × rate, half-up to the cent                        │
//! │  total    = taxable + tax                                              │
//! │                                                                         │
//! │  RETURN orders: compute exactly as above, then negate every            │
//! │  quantity and amount uniformly. A return is the mirror image of        │
//! │  the sale, discounts included.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order totals are sums of line amounts, so
//! `subtotal − discount_total + tax_total == total` holds by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{CartEntry, NormalizedCart};
use crate::money::Money;
use crate::rules::{LoyaltyRule, PromotionRule};
use crate::types::OrderType;

use super::matcher::{match_rules, LineEffect};

// =============================================================================
// Discount Mode
// =============================================================================

/// Who decides the discounts for this pricing pass.
///
/// Made explicit at the request level: the engine must never silently
/// guess whether caller-supplied per-line discounts are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountMode {
    /// Run the promotion matcher; ignore any supplied line discounts.
    EngineComputed,
    /// Trust the per-line discounts and labels on the request; skip the
    /// matcher entirely (e.g. replaying an already-priced order).
    CallerSupplied,
}

impl Default for DiscountMode {
    fn default() -> Self {
        DiscountMode::EngineComputed
    }
}

// =============================================================================
// Priced Output
// =============================================================================

/// One fully-priced order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub barcode: String,
    pub product_name: String,
    /// Signed: negative on returns.
    pub quantity: i64,
    pub unit_price: Money,
    /// Signed, same sign as `quantity`.
    pub free_items: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub tax_rate_bps: u32,
    pub tax: Money,
    pub total: Money,
    /// Audit labels of the rules that touched this line, joined.
    pub promotion_label: Option<String>,
    pub is_reward: bool,
}

/// A fully-priced order: lines plus the four header totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub total: Money,
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices the whole cart.
///
/// `at` is the single rule-snapshot instant for the pass. Line order in
/// the output matches the normalized cart (first-seen order), so the
/// same request always produces the same receipt.
pub fn price_cart(
    cart: &NormalizedCart,
    loyalty: &[LoyaltyRule],
    promotions: &[PromotionRule],
    at: DateTime<Utc>,
    order_type: OrderType,
    mode: DiscountMode,
) -> PricedOrder {
    let outcome = match mode {
        DiscountMode::EngineComputed => Some(match_rules(cart, loyalty, promotions, at)),
        DiscountMode::CallerSupplied => None,
    };

    let sign = order_type.sign();
    let mut lines = Vec::with_capacity(cart.len());
    let mut subtotal = Money::zero();
    let mut discount_total = Money::zero();
    let mut tax_total = Money::zero();
    let mut total = Money::zero();

    for entry in cart.entries() {
        let effect = outcome
            .as_ref()
            .and_then(|o| o.effect(&entry.product.barcode));
        let line = price_line(entry, effect, mode, sign);

        subtotal += line.subtotal;
        discount_total += line.discount;
        tax_total += line.tax;
        total += line.total;
        lines.push(line);
    }

    PricedOrder {
        lines,
        subtotal,
        discount_total,
        tax_total,
        total,
    }
}

fn price_line(
    entry: &CartEntry,
    effect: Option<&LineEffect>,
    mode: DiscountMode,
    sign: i64,
) -> PricedLine {
    let unit_price = entry.product.price();
    let subtotal = unit_price * entry.quantity;

    let (free_items, raw_discount, label) = match mode {
        DiscountMode::EngineComputed => match effect {
            Some(e) => {
                let bogo_value = unit_price * e.free_items;
                let label = if e.labels.is_empty() {
                    None
                } else {
                    Some(e.labels.join(", "))
                };
                (e.free_items, bogo_value + e.discount, label)
            }
            None => (0, Money::zero(), None),
        },
        DiscountMode::CallerSupplied => (
            0,
            Money::from_cents(entry.supplied_discount_cents.unwrap_or(0)),
            entry.supplied_promotion.clone(),
        ),
    };

    // Free units and amounts are clamped so a line never prices negative
    // and a discount never exceeds what the line is worth.
    let discount = raw_discount.clamp(Money::zero(), subtotal);
    let taxable = subtotal - discount;
    let tax = taxable.calculate_tax(entry.product.tax_rate());
    let line_total = taxable + tax;

    PricedLine {
        barcode: entry.product.barcode.clone(),
        product_name: entry.product.name.clone(),
        quantity: entry.quantity * sign,
        unit_price,
        free_items: free_items * sign,
        subtotal: subtotal * sign,
        discount: discount * sign,
        tax_rate_bps: entry.product.tax_rate_bps,
        tax: tax * sign,
        total: line_total * sign,
        promotion_label: label,
        is_reward: entry.is_reward,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{normalize, CartLine};
    use crate::rules::{PromotionDiscount, RuleScope};
    use crate::types::Product;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn product(barcode: &str, price_cents: i64, tax_bps: u32, category: Option<&str>) -> Product {
        Product {
            id: 1,
            barcode: barcode.to_string(),
            name: format!("Product {barcode}"),
            description: None,
            price_cents,
            category: category.map(str::to_string),
            tax_rate_bps: tax_bps,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products
            .into_iter()
            .map(|p| (p.barcode.clone(), p))
            .collect()
    }

    fn snapshot() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap()
    }

    fn percent_promo(bps: u32) -> PromotionRule {
        PromotionRule {
            id: 1,
            name: "Promo".to_string(),
            description: None,
            discount: PromotionDiscount::Percentage(bps),
            scope: RuleScope::Unscoped,
            min_purchase_cents: 0,
            max_discount_cents: None,
            is_active: true,
            start_date: None,
            end_date: None,
        }
    }

    /// Spec scenario: $10.00 item, 10% promotion, 8% tax.
    #[test]
    fn test_discount_then_tax() {
        let catalog = catalog(vec![product("001", 1000, 800, None)]);
        let cart = normalize(&[CartLine::new("001", 1)], &catalog).unwrap();

        let priced = price_cart(
            &cart,
            &[],
            &[percent_promo(1000)],
            snapshot(),
            OrderType::Sale,
            DiscountMode::EngineComputed,
        );

        let line = &priced.lines[0];
        assert_eq!(line.subtotal.cents(), 1000);
        assert_eq!(line.discount.cents(), 100);
        assert_eq!(line.tax.cents(), 72); // 8% of $9.00, not of $10.00
        assert_eq!(line.total.cents(), 972);

        assert_eq!(priced.subtotal.cents(), 1000);
        assert_eq!(priced.discount_total.cents(), 100);
        assert_eq!(priced.tax_total.cents(), 72);
        assert_eq!(priced.total.cents(), 972);
    }

    #[test]
    fn test_free_items_valued_at_unit_price() {
        let catalog = catalog(vec![product("001", 500, 0, None)]);
        let cart = normalize(&[CartLine::new("001", 4)], &catalog).unwrap();

        // Buy 2 get 1 on the same product: 2 sets → 2 free
        let rule = crate::rules::LoyaltyRule {
            id: 1,
            name: "B2G1".to_string(),
            kind: crate::rules::LoyaltyKind::BuyXGetY,
            trigger_barcodes: vec!["001".to_string()],
            reward_barcodes: vec!["001".to_string()],
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
        };

        let priced = price_cart(
            &cart,
            &[rule],
            &[],
            snapshot(),
            OrderType::Sale,
            DiscountMode::EngineComputed,
        );

        let line = &priced.lines[0];
        assert_eq!(line.free_items, 2);
        assert_eq!(line.discount.cents(), 1000); // 2 × $5.00
        assert_eq!(line.total.cents(), 1000); // $20.00 − $10.00, no tax
        assert_eq!(line.promotion_label.as_deref(), Some("B2G1 (2 free)"));
    }

    #[test]
    fn test_discount_clamped_at_subtotal() {
        let catalog = catalog(vec![product("001", 100, 800, None)]);
        let cart = normalize(&[CartLine::new("001", 1)], &catalog).unwrap();

        // $5.00 fixed discount on a $1.00 line
        let mut promo = percent_promo(0);
        promo.discount = PromotionDiscount::FixedAmount(500);

        let priced = price_cart(
            &cart,
            &[],
            &[promo],
            snapshot(),
            OrderType::Sale,
            DiscountMode::EngineComputed,
        );

        let line = &priced.lines[0];
        assert_eq!(line.discount.cents(), 100);
        assert_eq!(line.tax.cents(), 0);
        assert_eq!(line.total.cents(), 0);
    }

    /// Spec property: a return is the uniform negation of the sale.
    #[test]
    fn test_return_negates_everything() {
        let catalog = catalog(vec![product("001", 1000, 800, None)]);
        let cart = normalize(&[CartLine::new("001", 2)], &catalog).unwrap();
        let promos = [percent_promo(1000)];

        let sale = price_cart(
            &cart,
            &[],
            &promos,
            snapshot(),
            OrderType::Sale,
            DiscountMode::EngineComputed,
        );
        let ret = price_cart(
            &cart,
            &[],
            &promos,
            snapshot(),
            OrderType::Return,
            DiscountMode::EngineComputed,
        );

        assert_eq!(ret.subtotal, -sale.subtotal);
        assert_eq!(ret.discount_total, -sale.discount_total);
        assert_eq!(ret.tax_total, -sale.tax_total);
        assert_eq!(ret.total, -sale.total);
        assert_eq!(ret.lines[0].quantity, -sale.lines[0].quantity);
        assert_eq!(ret.lines[0].total, -sale.lines[0].total);
    }

    #[test]
    fn test_caller_supplied_mode_skips_matcher() {
        let catalog = catalog(vec![product("001", 1000, 0, None)]);
        let mut line = CartLine::new("001", 1);
        line.discount_cents = Some(250);
        line.promotion_name = Some("Manager override".to_string());
        let cart = normalize(&[line], &catalog).unwrap();

        // A matcher-visible promotion exists but must be ignored.
        let priced = price_cart(
            &cart,
            &[],
            &[percent_promo(5000)],
            snapshot(),
            OrderType::Sale,
            DiscountMode::CallerSupplied,
        );

        let line = &priced.lines[0];
        assert_eq!(line.discount.cents(), 250);
        assert_eq!(line.free_items, 0);
        assert_eq!(
            line.promotion_label.as_deref(),
            Some("Manager override")
        );
        assert_eq!(line.total.cents(), 750);
    }

    /// Spec invariant: subtotal − discount + tax == total, per line and
    /// for the header, on a mixed multi-line cart.
    #[test]
    fn test_totals_invariant() {
        let catalog = catalog(vec![
            product("001", 1099, 825, Some("drinks")),
            product("002", 333, 500, None),
            product("003", 2500, 0, Some("drinks")),
        ]);
        let cart = normalize(
            &[
                CartLine::new("001", 3),
                CartLine::new("002", 7),
                CartLine::new("003", 1),
            ],
            &catalog,
        )
        .unwrap();

        let mut drinks = percent_promo(1500);
        drinks.scope = RuleScope::ByCategory("drinks".to_string());

        let priced = price_cart(
            &cart,
            &[],
            &[drinks],
            snapshot(),
            OrderType::Sale,
            DiscountMode::EngineComputed,
        );

        for line in &priced.lines {
            assert_eq!(line.subtotal - line.discount + line.tax, line.total);
        }
        assert_eq!(
            priced.subtotal - priced.discount_total + priced.tax_total,
            priced.total
        );

        let from_lines: Money = priced.lines.iter().map(|l| l.total).sum();
        assert_eq!(from_lines, priced.total);
    }

    #[test]
    fn test_line_order_matches_cart_order() {
        let catalog = catalog(vec![
            product("B", 100, 0, None),
            product("A", 200, 0, None),
        ]);
        let cart = normalize(&[CartLine::new("B", 1), CartLine::new("A", 1)], &catalog).unwrap();

        let priced = price_cart(
            &cart,
            &[],
            &[],
            snapshot(),
            OrderType::Sale,
            DiscountMode::EngineComputed,
        );
        assert_eq!(priced.lines[0].barcode, "B");
        assert_eq!(priced.lines[1].barcode, "A");
    }
}
