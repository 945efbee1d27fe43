//! # Pricing Engine
//!
//! The pure pricing pipeline: match rules against a normalized cart,
//! then price every line deterministically.
//!
//! ```text
//! NormalizedCart ──▶ match_rules ──▶ MatchOutcome ──▶ price_cart ──▶ PricedOrder
//!                    (one snapshot         (per-barcode      (line amounts +
//!                     instant)              effects)          header totals)
//! ```

pub mod matcher;
pub mod pricer;

pub use matcher::{match_rules, LineEffect, MatchOutcome};
pub use pricer::{price_cart, DiscountMode, PricedLine, PricedOrder};
