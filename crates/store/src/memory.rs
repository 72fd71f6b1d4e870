use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartItemId, CategoryId, OrderId, ProductId, UserId};
use domain::{
    CartItemRecord, CartLine, CartSnapshot, Category, CategoryPatch, NewCategory, NewProduct,
    Order, OrderDraft, OrderStatus, Product, ProductPatch,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CommerceStore, Page},
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    carts: HashMap<UserId, Vec<CartItemRecord>>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store implementation.
///
/// Backs the test suites and the default server wiring. All tables live
/// behind one `RwLock`, so every multi-step mutation (notably
/// `commit_order`) runs under a single write guard and is atomic with
/// respect to concurrent calls.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

fn page_slice<T: Clone>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset())
        .take(page.limit())
        .collect()
}

#[async_trait]
impl CommerceStore for InMemoryStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            category_id: new.category_id,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, active_only: bool, page: Page) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        products.sort_by_key(|p| Reverse(p.created_at));
        Ok(page_slice(products, page))
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;

        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(category_id) = patch.category_id {
            product.category_id = category_id;
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn try_decrement_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        if product.stock < quantity {
            return Ok(false);
        }
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(true)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self, page: Page) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_slice(categories, page))
    }

    async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Result<Category> {
        let mut state = self.state.write().await;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Category", id))?;
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn cart_snapshot(&self, user_id: UserId) -> Result<CartSnapshot> {
        let state = self.state.read().await;
        let lines = state
            .carts
            .get(&user_id)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|record| {
                        let product = state.products.get(&record.product_id)?;
                        Some(CartLine {
                            item_id: record.id,
                            product_id: record.product_id,
                            product_name: product.name.clone(),
                            unit_price: product.price,
                            quantity: record.quantity,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(CartSnapshot { user_id, lines })
    }

    async fn get_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .get(&user_id)
            .and_then(|records| records.iter().find(|r| r.id == item_id).cloned()))
    }

    async fn find_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .get(&user_id)
            .and_then(|records| records.iter().find(|r| r.product_id == product_id).cloned()))
    }

    async fn put_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItemRecord> {
        let mut state = self.state.write().await;
        let stock = state
            .products
            .get(&product_id)
            .ok_or_else(|| StoreError::not_found("Product", product_id))?
            .stock;
        // Stored lines never exceed availability at write time.
        let quantity = quantity.min(stock);

        let records = state.carts.entry(user_id).or_default();
        if let Some(record) = records.iter_mut().find(|r| r.product_id == product_id) {
            record.quantity = quantity;
            return Ok(record.clone());
        }
        let record = CartItemRecord {
            id: CartItemId::new(),
            product_id,
            quantity,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn remove_cart_item(&self, user_id: UserId, item_id: CartItemId) -> Result<()> {
        let mut state = self.state.write().await;
        let records = state
            .carts
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found("Cart item", item_id))?;
        let before = records.len();
        records.retain(|r| r.id != item_id);
        if records.len() == before {
            return Err(StoreError::not_found("Cart item", item_id));
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<()> {
        self.state.write().await.carts.remove(&user_id);
        Ok(())
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<Order> {
        let mut state = self.state.write().await;

        // Validate every decrement before mutating anything, so a late
        // conflict cannot leave earlier lines decremented.
        for line in &draft.lines {
            let product = state
                .products
                .get(&line.product_id)
                .ok_or_else(|| StoreError::not_found("Product", line.product_id))?;
            if product.stock < line.quantity {
                return Err(StoreError::StockConflict {
                    product_id: line.product_id,
                    product_name: product.name.clone(),
                    available: product.stock,
                });
            }
        }

        let now = Utc::now();
        for line in &draft.lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
                product.updated_at = now;
            }
        }

        let order = Order {
            id: OrderId::new(),
            user_id: draft.user_id,
            status: OrderStatus::Pending,
            total_price: draft.total_price,
            shipping_address: draft.shipping_address,
            items: draft.lines,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        state.carts.remove(&draft.user_id);
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, page: Page) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by_key(|o| Reverse(o.created_at));
        Ok(page_slice(orders, page))
    }

    async fn orders_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| Reverse(o.created_at));
        Ok(page_slice(orders, page))
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use domain::OrderItem;

    async fn seed_product(store: &InMemoryStore, stock: u32, cents: i64) -> Product {
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
                price: Money::from_cents(cents),
                stock,
                category_id: category.id,
                is_active: true,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn try_decrement_respects_boundary() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 5, 1000).await;

        assert!(store.try_decrement_stock(product.id, 5).await.unwrap());
        assert!(!store.try_decrement_stock(product.id, 1).await.unwrap());
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn put_cart_item_clamps_to_stock() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 3, 1000).await;
        let user = UserId::new();

        let record = store.put_cart_item(user, product.id, 10).await.unwrap();
        assert_eq!(record.quantity, 3);
    }

    #[tokio::test]
    async fn put_cart_item_replaces_existing_line() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 10, 1000).await;
        let user = UserId::new();

        let first = store.put_cart_item(user, product.id, 2).await.unwrap();
        let second = store.put_cart_item(user, product.id, 5).await.unwrap();

        assert_eq!(first.id, second.id);
        let snapshot = store.cart_snapshot(user).await.unwrap();
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn commit_order_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let in_stock = seed_product(&store, 5, 1000).await;
        let sold_out = seed_product(&store, 1, 500).await;
        let user = UserId::new();

        let draft = OrderDraft {
            user_id: user,
            shipping_address: "1 Main St".to_string(),
            total_price: Money::from_cents(3000),
            lines: vec![
                OrderItem::new(in_stock.id, "Widget", 2, Money::from_cents(1000)),
                OrderItem::new(sold_out.id, "Widget", 2, Money::from_cents(500)),
            ],
        };

        let err = store.commit_order(draft).await.unwrap_err();
        assert!(matches!(err, StoreError::StockConflict { available: 1, .. }));

        // Nothing was decremented and no order was stored.
        assert_eq!(store.get_product(in_stock.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn commit_order_decrements_and_clears_cart() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 5, 2000).await;
        let user = UserId::new();
        store.put_cart_item(user, product.id, 1).await.unwrap();

        let draft = OrderDraft {
            user_id: user,
            shipping_address: "1 Main St".to_string(),
            total_price: Money::from_cents(2000),
            lines: vec![OrderItem::new(product.id, "Widget", 1, Money::from_cents(2000))],
        };
        let order = store.commit_order(draft).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 4);
        assert!(store.cart_snapshot(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_missing_cart_item_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .remove_cart_item(UserId::new(), CartItemId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_products_filters_inactive_and_paginates() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 1, 100).await;
        store
            .update_product(
                product.id,
                ProductPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store.list_products(true, Page::first()).await.unwrap().is_empty());
        assert_eq!(store.list_products(false, Page::first()).await.unwrap().len(), 1);
        assert!(store.list_products(false, Page::new(2)).await.unwrap().is_empty());
    }
}
