use async_trait::async_trait;
use common::{CartItemId, CategoryId, OrderId, ProductId, UserId};
use domain::{
    CartItemRecord, CartSnapshot, Category, CategoryPatch, NewCategory, NewProduct, Order,
    OrderDraft, OrderStatus, Product, ProductPatch,
};

use crate::error::Result;

/// A 1-based page over a listing, with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
}

impl Page {
    /// Fixed page size for all listings.
    pub const SIZE: usize = 10;

    /// Creates a page; numbers below 1 are treated as 1.
    pub fn new(number: u32) -> Self {
        Self {
            number: number.max(1),
        }
    }

    /// The first page.
    pub fn first() -> Self {
        Self::new(1)
    }

    /// Returns the 1-based page number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> usize {
        (self.number as usize - 1) * Self::SIZE
    }

    /// Number of rows to return.
    pub fn limit(&self) -> usize {
        Self::SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first()
    }
}

/// Storage seam for catalog, carts and orders.
///
/// Implementations must provide per-product atomicity for
/// [`try_decrement_stock`](CommerceStore::try_decrement_stock) and full
/// all-or-nothing semantics for [`commit_order`](CommerceStore::commit_order);
/// everything else is independent row operations.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    // -- Products --

    /// Inserts a new product and returns it.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Loads a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists products, newest first. `active_only` filters deactivated ones.
    async fn list_products(&self, active_only: bool, page: Page) -> Result<Vec<Product>>;

    /// Applies a partial update and returns the updated product.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product>;

    /// Replaces a product's stock level.
    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product>;

    /// Atomically decrements stock if at least `quantity` is available.
    ///
    /// Returns `false` (leaving stock unchanged) when it is not. A failed
    /// decrement is a definitive rejection, never a transient error.
    async fn try_decrement_stock(&self, id: ProductId, quantity: u32) -> Result<bool>;

    // -- Categories --

    /// Inserts a new category and returns it.
    async fn insert_category(&self, new: NewCategory) -> Result<Category>;

    /// Loads a category by id.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists categories ordered by name.
    async fn list_categories(&self, page: Page) -> Result<Vec<Category>>;

    /// Applies a partial update and returns the updated category.
    async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Result<Category>;

    // -- Carts --

    /// Returns the user's cart joined with live product data.
    ///
    /// A user with no cart rows gets an empty snapshot; carts are created
    /// lazily by the first write.
    async fn cart_snapshot(&self, user_id: UserId) -> Result<CartSnapshot>;

    /// Loads a single cart line owned by the user.
    async fn get_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>>;

    /// Finds the user's line for a product, if any.
    async fn find_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>>;

    /// Inserts or replaces the user's line for a product.
    ///
    /// The stored quantity is clamped to the product's current stock, so a
    /// line can never exceed availability at write time.
    async fn put_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItemRecord>;

    /// Removes a single cart line owned by the user.
    async fn remove_cart_item(&self, user_id: UserId, item_id: CartItemId) -> Result<()>;

    /// Removes every line from the user's cart.
    async fn clear_cart(&self, user_id: UserId) -> Result<()>;

    // -- Orders --

    /// Atomically persists an order with its items, decrements stock for
    /// every line, and clears the user's cart.
    ///
    /// If any line's decrement fails the whole commit is rolled back and a
    /// [`StoreError::StockConflict`](crate::StoreError::StockConflict)
    /// names the offending product.
    async fn commit_order(&self, draft: OrderDraft) -> Result<Order>;

    /// Loads an order with its items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self, page: Page) -> Result<Vec<Order>>;

    /// Lists one user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Order>>;

    /// Persists a new status for an order.
    ///
    /// Transition legality is the workflow's concern; the store writes
    /// whatever it is given.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_to_one() {
        assert_eq!(Page::new(0).number(), 1);
        assert_eq!(Page::new(0).offset(), 0);
    }

    #[test]
    fn page_offsets() {
        assert_eq!(Page::new(1).offset(), 0);
        assert_eq!(Page::new(3).offset(), 20);
        assert_eq!(Page::new(3).limit(), 10);
    }
}
