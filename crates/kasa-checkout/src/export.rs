//! # Order Export Payload
//!
//! Assembles the JSON payload the upstream back office ingests, stored
//! on the order row at creation time so the exporter never has to
//! re-derive it.
//!
//! ## Payload Shapes
//! ```text
//! SALE                                    RETURN
//! {                                       {
//!   "draft": false,                         "returns": [{
//!   "orders": [{                              "sale_order_name": "<original>",
//!     "id": "<order_number>",                 "return_lines": [
//!     "data": {                                 { "qty": <abs>, "price_unit",
//!       "name": "Order <number>",                 "product_id", "discount" }
//!       "amount_paid": <dollars>,             ],
//!       "amount_total": <dollars>,            "reason": "<return_reason>"
//!       "amount_tax": <dollars>,            }]
//!       "amount_return": 0,                 }
//!       "customer": { phone, name, vat? },
//!       "order_lines": [ ... ]
//!     }
//!   }]
//! }
//! ```
//!
//! Monetary fields are decimal dollars (the upstream contract); the
//! integer-cents discipline ends at this boundary. Reward lines export
//! a `price_unit` of 0 so the invoice shows the item as free.

use serde_json::{json, Value};

use kasa_core::{Order, OrderLine, OrderType};

fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Builds the export payload for an order and its lines.
pub fn order_export_json(order: &Order, lines: &[OrderLine]) -> String {
    let payload = match order.order_type {
        OrderType::Sale => sale_payload(order, lines),
        OrderType::Return => return_payload(order, lines),
    };
    payload.to_string()
}

fn sale_payload(order: &Order, lines: &[OrderLine]) -> Value {
    let mut customer = json!({
        "phone": order.customer_phone.as_deref().unwrap_or(""),
        "name": order.customer_name.as_deref().unwrap_or(""),
    });
    if let Some(vat) = order.customer_vat.as_deref().filter(|v| !v.is_empty()) {
        customer["vat"] = json!(vat);
    }

    let order_lines: Vec<Value> = lines
        .iter()
        .map(|line| {
            let mut node = json!({
                "qty": line.quantity,
                "price_unit": if line.is_reward { 0.0 } else { dollars(line.unit_price_cents) },
                "product_id": line.product_barcode,
                "discount": dollars(line.discount_cents),
            });
            if let Some(promotion) = &line.promotion_label {
                node["promotion"] = json!(promotion);
            }
            if line.is_reward {
                node["is_reward"] = json!(true);
            }
            node
        })
        .collect();

    json!({
        "draft": false,
        "orders": [{
            "id": order.order_number,
            "data": {
                "name": format!("Order {}", order.order_number),
                "amount_paid": dollars(order.total_cents),
                "amount_total": dollars(order.total_cents),
                "amount_tax": dollars(order.tax_cents),
                "amount_return": 0,
                "customer": customer,
                "order_lines": order_lines,
            }
        }]
    })
}

fn return_payload(order: &Order, lines: &[OrderLine]) -> Value {
    let return_lines: Vec<Value> = lines
        .iter()
        .map(|line| {
            json!({
                // Quantities are stored negative on returns; the upstream
                // return document wants them positive.
                "qty": line.quantity.abs(),
                "price_unit": dollars(line.unit_price_cents),
                "product_id": line.product_barcode,
                "discount": dollars(line.discount_cents.abs()),
            })
        })
        .collect();

    json!({
        "returns": [{
            "sale_order_name": order.original_order_number.as_deref().unwrap_or(""),
            "return_lines": return_lines,
            "reason": order.return_reason.as_deref().unwrap_or("Customer return"),
        }]
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kasa_core::{OrderStatus, PaymentMethod};

    fn order(order_type: OrderType) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            order_number: "ORD-1-20260615103000-0042".to_string(),
            order_type,
            session_id: 1,
            cashier_name: "alice".to_string(),
            status: OrderStatus::Completed,
            subtotal_cents: 1000,
            discount_cents: 100,
            tax_cents: 72,
            total_cents: 972,
            payment_method: PaymentMethod::Cash,
            customer_name: Some("Bob".to_string()),
            customer_phone: None,
            customer_vat: None,
            original_order_number: Some("ORD-1-20260610090000-0007".to_string()),
            return_reason: None,
            notes: None,
            order_json: None,
            sync_status: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(quantity: i64, is_reward: bool) -> OrderLine {
        OrderLine {
            id: "line-1".to_string(),
            order_id: 1,
            product_barcode: "1001".to_string(),
            product_name: "Cola 330ml".to_string(),
            quantity,
            unit_price_cents: 150,
            free_items: 0,
            subtotal_cents: 150 * quantity,
            discount_cents: 0,
            tax_rate_bps: 800,
            tax_cents: 0,
            total_cents: 150 * quantity,
            promotion_label: Some("Drinks 10% Off (-$0.15)".to_string()),
            is_reward,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sale_payload_shape() {
        let json = order_export_json(&order(OrderType::Sale), &[line(2, false)]);
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["draft"], json!(false));
        let data = &value["orders"][0]["data"];
        assert_eq!(data["amount_total"], json!(9.72));
        assert_eq!(data["amount_tax"], json!(0.72));
        assert_eq!(data["customer"]["name"], json!("Bob"));
        assert!(data["customer"].get("vat").is_none());

        let export_line = &data["order_lines"][0];
        assert_eq!(export_line["qty"], json!(2));
        assert_eq!(export_line["price_unit"], json!(1.5));
        assert_eq!(export_line["promotion"], json!("Drinks 10% Off (-$0.15)"));
        assert!(export_line.get("is_reward").is_none());
    }

    #[test]
    fn test_reward_line_exports_zero_price() {
        let json = order_export_json(&order(OrderType::Sale), &[line(1, true)]);
        let value: Value = serde_json::from_str(&json).unwrap();

        let export_line = &value["orders"][0]["data"]["order_lines"][0];
        assert_eq!(export_line["price_unit"], json!(0.0));
        assert_eq!(export_line["is_reward"], json!(true));
    }

    #[test]
    fn test_return_payload_positive_quantities() {
        let mut ret = order(OrderType::Return);
        ret.return_reason = Some("damaged".to_string());

        let json = order_export_json(&ret, &[line(-2, false)]);
        let value: Value = serde_json::from_str(&json).unwrap();

        let node = &value["returns"][0];
        assert_eq!(
            node["sale_order_name"],
            json!("ORD-1-20260610090000-0007")
        );
        assert_eq!(node["reason"], json!("damaged"));
        assert_eq!(node["return_lines"][0]["qty"], json!(2));
    }
}
