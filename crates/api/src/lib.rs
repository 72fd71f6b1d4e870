//! HTTP and WebSocket server for the commerce backend.
//!
//! Thin handlers over the workflow crates, with structured logging
//! (tracing), Prometheus metrics, read-through response caching for the
//! catalog surfaces, and per-user/admin WebSocket notification endpoints.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use cache::{CacheInvalidator, CacheStore, InMemoryCacheStore};
use checkout::{CartService, CheckoutService};
use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use notify::ChannelHub;
use store::CommerceStore;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CommerceStore> {
    pub store: Arc<S>,
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub cache: Arc<dyn CacheStore>,
    pub invalidator: CacheInvalidator,
    pub hub: Arc<ChannelHub>,
    pub cache_ttl: Duration,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Public catalog reads (cached)
        .route("/products", get(routes::catalog::list_products::<S>))
        .route("/products/{id}", get(routes::catalog::get_product::<S>))
        .route("/categories", get(routes::catalog::list_categories::<S>))
        // Admin catalog writes (invalidate before responding)
        .route("/admin/products", post(routes::catalog::create_product::<S>))
        .route("/admin/products/{id}", patch(routes::catalog::update_product::<S>))
        .route(
            "/admin/products/{id}/stock",
            patch(routes::catalog::update_stock::<S>),
        )
        .route("/admin/categories", post(routes::catalog::create_category::<S>))
        .route(
            "/admin/categories/{id}",
            get(routes::catalog::get_category::<S>).patch(routes::catalog::update_category::<S>),
        )
        // Cart (customer)
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/add", post(routes::cart::add::<S>))
        .route(
            "/cart/items/{id}",
            patch(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/cart/clear", delete(routes::cart::clear::<S>))
        // Orders
        .route("/orders/create", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list_mine::<S>))
        .route("/orders/{id}", get(routes::orders::get_mine::<S>))
        .route("/admin/orders", get(routes::orders::admin_list::<S>))
        .route("/admin/orders/{id}", get(routes::orders::admin_get::<S>))
        .route(
            "/admin/orders/{id}/status",
            patch(routes::orders::admin_update_status::<S>),
        )
        // Cache administration
        .route("/admin/cache/stats", get(routes::cache_admin::stats::<S>))
        .route("/admin/cache/clear", post(routes::cache_admin::clear::<S>))
        .route(
            "/admin/cache/invalidate-products",
            post(routes::cache_admin::invalidate_products::<S>),
        )
        .route(
            "/admin/cache/invalidate-categories",
            post(routes::cache_admin::invalidate_categories::<S>),
        )
        // WebSocket notification channels
        .route("/ws/orders", get(routes::ws::customer::<S>))
        .route("/ws/admin/orders", get(routes::ws::admin::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the application state over the given store and cache backend.
///
/// Spawns the notification dispatcher; the returned handle ends when the
/// state (and with it the last `Notifier`) is dropped.
pub fn create_state<S: CommerceStore + 'static>(
    store: S,
    cache_store: Arc<dyn CacheStore>,
    config: &Config,
) -> (Arc<AppState<S>>, JoinHandle<()>) {
    let store = Arc::new(store);
    let hub = Arc::new(ChannelHub::new());
    let (notifier, dispatcher) =
        notify::spawn_dispatcher_with_capacity(hub.clone(), config.notify_queue_capacity);
    let invalidator = CacheInvalidator::new(cache_store.clone());

    let state = Arc::new(AppState {
        carts: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone(), notifier, invalidator.clone()),
        store,
        cache: cache_store,
        invalidator,
        hub,
        cache_ttl: Duration::from_secs(config.cache_ttl_secs),
    });

    (state, dispatcher)
}

/// Creates state over an in-memory cache with default configuration.
pub fn create_default_state<S: CommerceStore + 'static>(
    store: S,
) -> (Arc<AppState<S>>, JoinHandle<()>) {
    create_state(
        store,
        Arc::new(InMemoryCacheStore::new()),
        &Config::default(),
    )
}
