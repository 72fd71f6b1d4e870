use std::sync::Arc;

use common::{CartItemId, ProductId, UserId};
use domain::{CartError, CartSnapshot};
use store::{CommerceStore, StoreError};

use crate::error::CheckoutError;

/// Service over one-user mutable carts.
///
/// Quantity handling is deliberately asymmetric: adding to an existing
/// line clamps the summed quantity to available stock, while updating a
/// line rejects anything over stock. This mirrors the long-observed
/// behavior of the write paths and is covered by tests; do not "fix" one
/// side to match the other.
pub struct CartService<S: CommerceStore> {
    store: Arc<S>,
}

impl<S: CommerceStore> Clone for CartService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CommerceStore> CartService<S> {
    /// Creates a cart service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating it lazily on first access.
    #[tracing::instrument(skip(self))]
    pub async fn cart(&self, user_id: UserId) -> Result<CartSnapshot, CheckoutError> {
        Ok(self.store.cart_snapshot(user_id).await?)
    }

    /// Adds a product to the cart, or increments its existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CheckoutError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartError::ProductNotFound)?;

        if !product.in_stock() {
            return Err(CartError::OutOfStock.into());
        }
        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            }
            .into());
        }

        let requested = match self.store.find_cart_line(user_id, product_id).await? {
            // The summed quantity is clamped to stock by the store.
            Some(line) => line.quantity + quantity,
            None => quantity,
        };
        self.store
            .put_cart_item(user_id, product_id, requested)
            .await?;

        self.cart(user_id).await
    }

    /// Replaces a line's quantity.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, CheckoutError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }

        let record = self
            .store
            .get_cart_item(user_id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;
        let product = self
            .store
            .get_product(record.product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            }
            .into());
        }

        self.store
            .put_cart_item(user_id, record.product_id, quantity)
            .await?;

        self.cart(user_id).await
    }

    /// Removes a single line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartSnapshot, CheckoutError> {
        self.store
            .remove_cart_item(user_id, item_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => CheckoutError::Cart(CartError::ItemNotFound),
                other => other.into(),
            })?;

        self.cart(user_id).await
    }

    /// Removes every line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<CartSnapshot, CheckoutError> {
        self.store.clear_cart(user_id).await?;
        self.cart(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use common::Money;
    use domain::{NewCategory, NewProduct, Product, ProductPatch};
    use store::InMemoryStore;

    use super::*;

    async fn seed_product(store: &InMemoryStore, stock: u32) -> Product {
        let category = store
            .insert_category(NewCategory {
                name: "Tools".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        store
            .insert_product(NewProduct {
                name: "Widget".to_string(),
                description: "A widget".to_string(),
                price: Money::from_cents(1000),
                stock,
                category_id: category.id,
                is_active: true,
            })
            .await
            .unwrap()
    }

    fn service(store: &Arc<InMemoryStore>) -> CartService<InMemoryStore> {
        CartService::new(store.clone())
    }

    #[tokio::test]
    async fn first_access_creates_empty_cart() {
        let store = Arc::new(InMemoryStore::new());
        let cart = service(&store).cart(UserId::new()).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn add_item_builds_a_line() {
        let store = Arc::new(InMemoryStore::new());
        let product = seed_product(&store, 5).await;
        let carts = service(&store);
        let user = UserId::new();

        let cart = carts.add_item(user, product.id, 2).await.unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.total_price().cents(), 2000);
    }

    #[tokio::test]
    async fn add_item_rejects_over_stock() {
        let store = Arc::new(InMemoryStore::new());
        let product = seed_product(&store, 3).await;
        let carts = service(&store);

        let err = carts.add_item(UserId::new(), product.id, 4).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Cart(CartError::InsufficientStock { available: 3 })
        ));
    }

    #[tokio::test]
    async fn add_item_rejects_out_of_stock_and_inactive() {
        let store = Arc::new(InMemoryStore::new());
        let sold_out = seed_product(&store, 0).await;
        let inactive = seed_product(&store, 5).await;
        store
            .update_product(
                inactive.id,
                ProductPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let carts = service(&store);
        let user = UserId::new();

        assert!(matches!(
            carts.add_item(user, sold_out.id, 1).await.unwrap_err(),
            CheckoutError::Cart(CartError::OutOfStock)
        ));
        assert!(matches!(
            carts.add_item(user, inactive.id, 1).await.unwrap_err(),
            CheckoutError::Cart(CartError::ProductNotFound)
        ));
    }

    #[tokio::test]
    async fn incrementing_existing_line_clamps_to_stock() {
        let store = Arc::new(InMemoryStore::new());
        let product = seed_product(&store, 5).await;
        let carts = service(&store);
        let user = UserId::new();

        carts.add_item(user, product.id, 3).await.unwrap();
        let cart = carts.add_item(user, product.id, 4).await.unwrap();

        // 3 + 4 exceeds stock 5; the stored line clamps rather than fails.
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn update_item_rejects_over_stock_instead_of_clamping() {
        let store = Arc::new(InMemoryStore::new());
        let product = seed_product(&store, 5).await;
        let carts = service(&store);
        let user = UserId::new();

        let cart = carts.add_item(user, product.id, 2).await.unwrap();
        let item_id = cart.lines[0].item_id;

        let err = carts.update_item(user, item_id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Cart(CartError::InsufficientStock { available: 5 })
        ));

        // The line is unchanged.
        let cart = carts.cart(user).await.unwrap();
        assert_eq!(cart.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn update_and_remove_missing_item() {
        let store = Arc::new(InMemoryStore::new());
        seed_product(&store, 5).await;
        let carts = service(&store);
        let user = UserId::new();

        assert!(matches!(
            carts.update_item(user, CartItemId::new(), 1).await.unwrap_err(),
            CheckoutError::Cart(CartError::ItemNotFound)
        ));
        assert!(matches!(
            carts.remove_item(user, CartItemId::new()).await.unwrap_err(),
            CheckoutError::Cart(CartError::ItemNotFound)
        ));
    }

    #[tokio::test]
    async fn clear_empties_the_cart() {
        let store = Arc::new(InMemoryStore::new());
        let product = seed_product(&store, 5).await;
        let carts = service(&store);
        let user = UserId::new();

        carts.add_item(user, product.id, 2).await.unwrap();
        let cart = carts.clear(user).await.unwrap();

        assert!(cart.is_empty());
    }
}
