//! Per-user cart types.
//!
//! The stored shape is [`CartItemRecord`]; the read shape is
//! [`CartSnapshot`], whose lines are joined against live product data.
//! Totals are always derived from the current lines, never stored, since
//! prices and stock can change between reads.

use common::{CartItemId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A stored cart line: one product with a quantity.
///
/// Uniqueness over (user, product) is enforced by the store; adding an
/// existing product increments the line instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart line enriched with the product's current name and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    /// Returns the total price for this line.
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A point-in-time view of one user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Returns an empty snapshot for the given user.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line totals.
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::total_price).sum()
    }

    /// Total number of units across all lines.
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(cents: i64, quantity: u32) -> CartLine {
        CartLine {
            item_id: CartItemId::new(),
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            unit_price: Money::from_cents(cents),
            quantity,
        }
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = CartSnapshot::empty(UserId::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_price(), Money::zero());
        assert_eq!(snapshot.total_items(), 0);
    }

    #[test]
    fn totals_are_derived_from_lines() {
        let snapshot = CartSnapshot {
            user_id: UserId::new(),
            lines: vec![line(1000, 2), line(500, 3)],
        };
        assert_eq!(snapshot.total_price().cents(), 3500);
        assert_eq!(snapshot.total_items(), 5);
    }

    #[test]
    fn line_total() {
        assert_eq!(line(250, 4).total_price().cents(), 1000);
    }
}
