//! Immutable orders and their line items.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// A line item frozen at order time.
///
/// Quantity and unit price are copied out of the cart when the order is
/// committed and never change afterwards, regardless of later product
/// edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this item.
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An immutable record of a completed purchase.
///
/// The total is fixed at creation from the cart and never recalculated.
/// Only the status mutates, and only along [`OrderStatus`] transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub shipping_address: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all items.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Everything the store needs to commit a new order atomically.
///
/// Built by the order workflow from a cart snapshot; lines already carry
/// the frozen name and unit price.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub shipping_address: String,
    pub total_price: Money,
    pub lines: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_total_price() {
        let item = OrderItem::new(ProductId::new(), "Widget", 3, Money::from_cents(1000));
        assert_eq!(item.total_price().cents(), 3000);
    }

    #[test]
    fn order_total_items() {
        let order = Order {
            id: OrderId::new(),
            user_id: UserId::new(),
            status: OrderStatus::Pending,
            total_price: Money::from_cents(2500),
            shipping_address: "1 Main St".to_string(),
            items: vec![
                OrderItem::new(ProductId::new(), "Widget", 2, Money::from_cents(1000)),
                OrderItem::new(ProductId::new(), "Gadget", 1, Money::from_cents(500)),
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.total_items(), 3);
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = Order {
            id: OrderId::new(),
            user_id: UserId::new(),
            status: OrderStatus::Shipped,
            total_price: Money::from_cents(999),
            shipping_address: "1 Main St".to_string(),
            items: vec![OrderItem::new(
                ProductId::new(),
                "Widget",
                1,
                Money::from_cents(999),
            )],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
