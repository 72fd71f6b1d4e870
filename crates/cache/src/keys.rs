//! Cache key builders.
//!
//! Detail keys embed the entity id; list keys embed the page number under
//! a common prefix so one prefix delete covers every page.

use common::{CategoryId, OrderId, ProductId, UserId};

/// Prefix covering every cached product list page.
pub const PRODUCTS_LIST_PREFIX: &str = "products_list";

/// Prefix covering every cached category list page.
pub const CATEGORIES_LIST_PREFIX: &str = "categories_list";

/// Prefix covering every cached admin order list page.
pub const ORDERS_LIST_PREFIX: &str = "orders_list";

/// Key for one product's detail view.
pub fn product_detail(id: ProductId) -> String {
    format!("product_detail_{id}")
}

/// Key for one page of the public product list.
pub fn products_list(page: u32) -> String {
    format!("{PRODUCTS_LIST_PREFIX}:p{page}")
}

/// Key for one category's detail view.
pub fn category_detail(id: CategoryId) -> String {
    format!("category_detail_{id}")
}

/// Key for one page of the public category list.
pub fn categories_list(page: u32) -> String {
    format!("{CATEGORIES_LIST_PREFIX}:p{page}")
}

/// Key for one order's detail view.
pub fn order_detail(id: OrderId) -> String {
    format!("order_detail_{id}")
}

/// Key for one page of the admin order list.
pub fn orders_list(page: u32) -> String {
    format!("{ORDERS_LIST_PREFIX}:p{page}")
}

/// Key for one user's order list.
pub fn user_orders(user_id: UserId) -> String {
    format!("user_orders_{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keys_share_their_prefix() {
        assert!(products_list(1).starts_with(PRODUCTS_LIST_PREFIX));
        assert!(products_list(7).starts_with(PRODUCTS_LIST_PREFIX));
        assert!(categories_list(2).starts_with(CATEGORIES_LIST_PREFIX));
        assert!(orders_list(3).starts_with(ORDERS_LIST_PREFIX));
    }

    #[test]
    fn detail_keys_embed_the_id() {
        let id = ProductId::new();
        assert_eq!(product_detail(id), format!("product_detail_{id}"));
    }
}
