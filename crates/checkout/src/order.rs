use std::sync::Arc;

use cache::CacheInvalidator;
use common::{OrderId, UserId};
use domain::{CartError, Order, OrderDraft, OrderError, OrderItem, OrderStatus};
use notify::{Channel, NotificationEvent, Notifier};
use store::{CommerceStore, StoreError};

use crate::error::CheckoutError;

/// The order placement and status workflow.
///
/// Placement converts the user's cart into an immutable order inside the
/// store's all-or-nothing commit. Cache invalidation runs synchronously
/// after the commit; notification fan-out is enqueued fire-and-forget.
/// Neither can fail an order that has already committed.
pub struct CheckoutService<S: CommerceStore> {
    store: Arc<S>,
    notifier: Notifier,
    invalidator: CacheInvalidator,
}

impl<S: CommerceStore> CheckoutService<S> {
    /// Creates the workflow over its injected collaborators.
    pub fn new(store: Arc<S>, notifier: Notifier, invalidator: CacheInvalidator) -> Self {
        Self {
            store,
            notifier,
            invalidator,
        }
    }

    /// Places an order from the user's cart.
    ///
    /// Every line is pre-checked against current stock before anything
    /// mutates; the commit then re-checks each decrement inside the
    /// transaction, so a race between the two surfaces as the same
    /// stock-conflict error with nothing partially applied.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping_address: &str,
    ) -> Result<Order, CheckoutError> {
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(OrderError::EmptyShippingAddress.into());
        }

        let started = std::time::Instant::now();

        let snapshot = self.store.cart_snapshot(user_id).await?;
        if snapshot.is_empty() {
            return Err(OrderError::EmptyCart.into());
        }

        // Fail-fast pre-check over all lines before any mutation.
        for line in &snapshot.lines {
            let product = self
                .store
                .get_product(line.product_id)
                .await?
                .ok_or(CartError::ProductNotFound)?;
            if line.quantity > product.stock {
                metrics::counter!("order_stock_conflicts_total").increment(1);
                return Err(OrderError::InsufficientStock {
                    product_name: product.name,
                    available: product.stock,
                }
                .into());
            }
        }

        let draft = OrderDraft {
            user_id,
            shipping_address: shipping_address.to_string(),
            total_price: snapshot.total_price(),
            lines: snapshot
                .lines
                .iter()
                .map(|line| {
                    OrderItem::new(
                        line.product_id,
                        line.product_name.clone(),
                        line.quantity,
                        line.unit_price,
                    )
                })
                .collect(),
        };

        let order = match self.store.commit_order(draft).await {
            Ok(order) => order,
            Err(StoreError::StockConflict {
                product_name,
                available,
                ..
            }) => {
                metrics::counter!("order_stock_conflicts_total").increment(1);
                return Err(OrderError::InsufficientStock {
                    product_name,
                    available,
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        };

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total_cents = order.total_price.cents(), "order placed");

        self.invalidate_after_placement(&order).await;

        self.notifier.enqueue(
            Channel::User(user_id),
            NotificationEvent::order_created(order.id),
        );
        self.notifier
            .enqueue(Channel::Admin, NotificationEvent::new_order(order.id, user_id));

        Ok(order)
    }

    /// Moves an order to a new status.
    ///
    /// Rejected transitions leave the order untouched; accepted ones emit
    /// the user and admin events strictly after the status is persisted.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Order", order_id))?;

        let old_status = order.status;
        if !old_status.can_transition_to(new_status) {
            return Err(OrderError::InvalidStatusTransition {
                from: old_status,
                to: new_status,
            }
            .into());
        }

        let updated = self.store.set_order_status(order_id, new_status).await?;
        metrics::counter!("order_status_updates_total").increment(1);
        tracing::info!(order_id = %order_id, %old_status, %new_status, "order status updated");

        if let Err(err) = self
            .invalidator
            .invalidate_order(Some(order_id), Some(updated.user_id))
            .await
        {
            tracing::warn!(%err, order_id = %order_id, "order cache invalidation failed");
        }

        self.notifier.enqueue(
            Channel::User(updated.user_id),
            NotificationEvent::order_update(order_id, old_status, new_status),
        );
        self.notifier.enqueue(
            Channel::Admin,
            NotificationEvent::order_status_changed(
                order_id,
                updated.user_id,
                old_status,
                new_status,
            ),
        );

        Ok(updated)
    }

    /// Invalidates order caches and the caches of every decremented
    /// product. A backend failure is logged; the order stands.
    async fn invalidate_after_placement(&self, order: &Order) {
        if let Err(err) = self
            .invalidator
            .invalidate_order(Some(order.id), Some(order.user_id))
            .await
        {
            tracing::warn!(%err, order_id = %order.id, "order cache invalidation failed");
        }
        for item in &order.items {
            if let Err(err) = self.invalidator.invalidate_product(Some(item.product_id)).await {
                tracing::warn!(%err, product_id = %item.product_id, "product cache invalidation failed");
            }
        }
    }
}
