//! Order endpoints: customer placement/reads and admin management.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use cache::keys;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use store::CommerceStore;

use crate::AppState;
use crate::auth::{Identity, Operation, authorize};
use crate::error::ApiError;
use crate::routes::{PageQuery, cache_get, cache_put, cached_response};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            total_cents: item.total_price().cents(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub total_items: u32,
    pub shipping_address: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_cents: order.total_price.cents(),
            total_items: order.total_items(),
            shipping_address: order.shipping_address.clone(),
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct OrderMessageResponse {
    pub message: String,
    pub order: OrderResponse,
}

fn to_value<T: Serialize>(body: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Internal(err.to_string()))
}

// -- Customer handlers --

/// POST /orders/create — place an order from the caller's cart.
#[tracing::instrument(skip(state, identity, req))]
pub async fn create<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderMessageResponse>), ApiError> {
    authorize(&identity, Operation::PlaceOrder)?;

    let order = state
        .checkout
        .place_order(identity.user_id, &req.shipping_address)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderMessageResponse {
            message: "Order created successfully".to_string(),
            order: order.into(),
        }),
    ))
}

/// GET /orders — the caller's orders, newest first.
///
/// The first page is served read-through from the `user_orders` key so a
/// status change or new order is visible immediately after its
/// invalidation; later pages bypass the cache.
#[tracing::instrument(skip(state, identity))]
pub async fn list_mine<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    authorize(&identity, Operation::ViewOwnOrders)?;

    let page = query.page();
    let key = (page.number() == 1).then(|| keys::user_orders(identity.user_id));

    if let Some(key) = &key {
        if let Some(value) = cache_get(&state, key).await {
            return Ok(cached_response(value, "HIT"));
        }
    }

    let orders = state.store.orders_for_user(identity.user_id, page).await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    let value = to_value(&body)?;
    if let Some(key) = &key {
        cache_put(&state, key, value.clone()).await;
    }
    Ok(cached_response(value, "MISS"))
}

/// GET /orders/{id} — one of the caller's orders.
#[tracing::instrument(skip(state, identity))]
pub async fn get_mine<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    authorize(&identity, Operation::ViewOwnOrders)?;

    let order = state
        .store
        .get_order(id)
        .await?
        .filter(|order| order.user_id == identity.user_id)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(order.into()))
}

// -- Admin handlers --

/// GET /admin/orders — cached page over all orders.
#[tracing::instrument(skip(state, identity))]
pub async fn admin_list<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    authorize(&identity, Operation::ManageOrders)?;

    let page = query.page();
    let key = keys::orders_list(page.number());

    if let Some(value) = cache_get(&state, &key).await {
        return Ok(cached_response(value, "HIT"));
    }

    let orders = state.store.list_orders(page).await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    let value = to_value(&body)?;
    cache_put(&state, &key, value.clone()).await;
    Ok(cached_response(value, "MISS"))
}

/// GET /admin/orders/{id} — cached order detail.
#[tracing::instrument(skip(state, identity))]
pub async fn admin_get<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Response, ApiError> {
    authorize(&identity, Operation::ManageOrders)?;

    let key = keys::order_detail(id);
    if let Some(value) = cache_get(&state, &key).await {
        return Ok(cached_response(value, "HIT"));
    }

    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
    let value = to_value(&OrderResponse::from(order))?;
    cache_put(&state, &key, value.clone()).await;
    Ok(cached_response(value, "MISS"))
}

/// PATCH /admin/orders/{id}/status — move an order along its lifecycle.
#[tracing::instrument(skip(state, identity, req))]
pub async fn admin_update_status<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderMessageResponse>, ApiError> {
    authorize(&identity, Operation::ManageOrders)?;

    let new_status: OrderStatus = req
        .status
        .parse()
        .map_err(|()| ApiError::BadRequest(format!("Invalid status: {}", req.status)))?;

    let order = state.checkout.update_status(id, new_status).await?;

    Ok(Json(OrderMessageResponse {
        message: format!("Order status updated to {new_status}"),
        order: order.into(),
    }))
}
