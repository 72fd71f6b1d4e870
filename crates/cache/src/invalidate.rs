use std::sync::Arc;

use common::{CategoryId, OrderId, ProductId, UserId};

use crate::{
    Result, keys,
    store::{CacheStats, CacheStore},
};

/// Deletes the cache keys a write could have made stale.
///
/// The backend is injected at construction so workflows and handlers can
/// be tested against a substitutable fake. Invalidation is synchronous:
/// a write path calls the matching method before returning its response.
/// When the backend itself is down the caller logs and moves on; a cache
/// error never reverts the committed write that triggered it.
#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn CacheStore>,
}

impl CacheInvalidator {
    /// Creates an invalidator over the given backend.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Invalidates one product's detail key (when given) and every
    /// product list page.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_product(&self, id: Option<ProductId>) -> Result<()> {
        if let Some(id) = id {
            self.store.delete(&keys::product_detail(id)).await?;
        }
        self.store.delete_prefix(keys::PRODUCTS_LIST_PREFIX).await?;
        metrics::counter!("cache_invalidations_total", "entity" => "product").increment(1);
        Ok(())
    }

    /// Invalidates one category's detail key (when given) and every
    /// category list page.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_category(&self, id: Option<CategoryId>) -> Result<()> {
        if let Some(id) = id {
            self.store.delete(&keys::category_detail(id)).await?;
        }
        self.store
            .delete_prefix(keys::CATEGORIES_LIST_PREFIX)
            .await?;
        metrics::counter!("cache_invalidations_total", "entity" => "category").increment(1);
        Ok(())
    }

    /// Invalidates an order's detail key, its owner's order list, and
    /// every admin order list page.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_order(
        &self,
        id: Option<OrderId>,
        user_id: Option<UserId>,
    ) -> Result<()> {
        if let Some(id) = id {
            self.store.delete(&keys::order_detail(id)).await?;
        }
        if let Some(user_id) = user_id {
            self.store.delete(&keys::user_orders(user_id)).await?;
        }
        self.store.delete_prefix(keys::ORDERS_LIST_PREFIX).await?;
        metrics::counter!("cache_invalidations_total", "entity" => "order").increment(1);
        Ok(())
    }

    /// Deletes every cached entry.
    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Returns backend statistics.
    pub async fn stats(&self) -> Result<CacheStats> {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::InMemoryCacheStore;

    const TTL: Duration = Duration::from_secs(3600);

    fn invalidator() -> (CacheInvalidator, Arc<InMemoryCacheStore>) {
        let store = Arc::new(InMemoryCacheStore::new());
        (CacheInvalidator::new(store.clone()), store)
    }

    #[tokio::test]
    async fn invalidate_product_removes_detail_and_lists() {
        let (invalidator, store) = invalidator();
        let id = ProductId::new();
        store
            .set(&keys::product_detail(id), json!({"stale": true}), TTL)
            .await
            .unwrap();
        store.set(&keys::products_list(1), json!([1]), TTL).await.unwrap();
        store.set(&keys::products_list(2), json!([2]), TTL).await.unwrap();

        invalidator.invalidate_product(Some(id)).await.unwrap();

        // No read after an invalidation may see a value cached before it.
        assert_eq!(store.get(&keys::product_detail(id)).await.unwrap(), None);
        assert_eq!(store.get(&keys::products_list(1)).await.unwrap(), None);
        assert_eq!(store.get(&keys::products_list(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalidate_product_without_id_only_touches_lists() {
        let (invalidator, store) = invalidator();
        let id = ProductId::new();
        store
            .set(&keys::product_detail(id), json!(1), TTL)
            .await
            .unwrap();
        store.set(&keys::products_list(1), json!([1]), TTL).await.unwrap();

        invalidator.invalidate_product(None).await.unwrap();

        assert!(store.get(&keys::product_detail(id)).await.unwrap().is_some());
        assert_eq!(store.get(&keys::products_list(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalidate_order_covers_user_and_admin_lists() {
        let (invalidator, store) = invalidator();
        let order_id = OrderId::new();
        let user_id = UserId::new();
        store
            .set(&keys::order_detail(order_id), json!(1), TTL)
            .await
            .unwrap();
        store
            .set(&keys::user_orders(user_id), json!([1]), TTL)
            .await
            .unwrap();
        store.set(&keys::orders_list(1), json!([1]), TTL).await.unwrap();

        invalidator
            .invalidate_order(Some(order_id), Some(user_id))
            .await
            .unwrap();

        assert_eq!(store.get(&keys::order_detail(order_id)).await.unwrap(), None);
        assert_eq!(store.get(&keys::user_orders(user_id)).await.unwrap(), None);
        assert_eq!(store.get(&keys::orders_list(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn backend_failure_is_reported_not_swallowed_here() {
        let (invalidator, store) = invalidator();
        store.set_fail(true);
        assert!(invalidator.invalidate_product(None).await.is_err());
        assert!(invalidator.stats().await.is_err());
    }
}
