//! Domain error types.

use thiserror::Error;

use crate::status::OrderStatus;

/// Errors from cart operations.
///
/// All of these are expected, user-facing outcomes; none of them leaves
/// cart or stock state changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product does not exist or is inactive.
    #[error("Product not found")]
    ProductNotFound,

    /// The product has zero stock.
    #[error("Product is out of stock")]
    OutOfStock,

    /// The requested quantity exceeds available stock.
    #[error("Only {available} items available in stock")]
    InsufficientStock { available: u32 },

    /// The cart line does not exist for this user.
    #[error("Cart item not found")]
    ItemNotFound,

    /// Quantity below the allowed minimum.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

/// Errors from the order workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line's quantity exceeds the product's current stock.
    #[error("Insufficient stock for {product_name}. Available: {available}")]
    InsufficientStock {
        product_name: String,
        available: u32,
    },

    /// The requested status change is not a legal transition.
    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Shipping address was blank.
    #[error("Shipping address cannot be empty")]
    EmptyShippingAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_product_and_count() {
        let err = OrderError::InsufficientStock {
            product_name: "Widget".to_string(),
            available: 3,
        };
        assert_eq!(err.to_string(), "Insufficient stock for Widget. Available: 3");
    }

    #[test]
    fn transition_message_uses_wire_names() {
        let err = OrderError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.to_string(), "Cannot change status from delivered to pending");
    }

    #[test]
    fn cart_error_messages() {
        assert_eq!(
            CartError::InsufficientStock { available: 2 }.to_string(),
            "Only 2 items available in stock"
        );
        assert_eq!(CartError::ItemNotFound.to_string(), "Cart item not found");
    }
}
