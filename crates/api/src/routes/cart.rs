//! Cart endpoints (customer only).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{CartItemId, ProductId, UserId};
use domain::{CartLine, CartSnapshot};
use serde::{Deserialize, Serialize};
use store::CommerceStore;

use crate::AppState;
use crate::auth::{Identity, Operation, authorize};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartLineResponse {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            item_id: line.item_id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            total_cents: line.total_price().cents(),
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub user_id: UserId,
    pub items: Vec<CartLineResponse>,
    pub total_items: u32,
    pub total_cents: i64,
}

impl From<CartSnapshot> for CartResponse {
    fn from(snapshot: CartSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id,
            total_items: snapshot.total_items(),
            total_cents: snapshot.total_price().cents(),
            items: snapshot.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct CartMessageResponse {
    pub message: &'static str,
    pub cart: CartResponse,
}

// -- Handlers --

/// GET /cart — the caller's cart, created lazily on first access.
#[tracing::instrument(skip(state, identity))]
pub async fn get<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<CartResponse>, ApiError> {
    authorize(&identity, Operation::ViewCart)?;
    let snapshot = state.carts.cart(identity.user_id).await?;
    Ok(Json(snapshot.into()))
}

/// POST /cart/add — add a product (or increment its line).
#[tracing::instrument(skip(state, identity, req))]
pub async fn add<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartMessageResponse>, ApiError> {
    authorize(&identity, Operation::MutateCart)?;
    let snapshot = state
        .carts
        .add_item(identity.user_id, req.product_id, req.quantity)
        .await?;
    Ok(Json(CartMessageResponse {
        message: "Product added to cart successfully",
        cart: snapshot.into(),
    }))
}

/// PATCH /cart/items/{id} — replace a line's quantity.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update_item<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(item_id): Path<CartItemId>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<CartMessageResponse>, ApiError> {
    authorize(&identity, Operation::MutateCart)?;
    let snapshot = state
        .carts
        .update_item(identity.user_id, item_id, req.quantity)
        .await?;
    Ok(Json(CartMessageResponse {
        message: "Cart item updated successfully",
        cart: snapshot.into(),
    }))
}

/// DELETE /cart/items/{id} — remove a line.
#[tracing::instrument(skip(state, identity))]
pub async fn remove_item<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartMessageResponse>, ApiError> {
    authorize(&identity, Operation::MutateCart)?;
    let snapshot = state.carts.remove_item(identity.user_id, item_id).await?;
    Ok(Json(CartMessageResponse {
        message: "Item removed from cart successfully",
        cart: snapshot.into(),
    }))
}

/// DELETE /cart/clear — remove every line.
#[tracing::instrument(skip(state, identity))]
pub async fn clear<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<CartMessageResponse>, ApiError> {
    authorize(&identity, Operation::MutateCart)?;
    let snapshot = state.carts.clear(identity.user_id).await?;
    Ok(Json(CartMessageResponse {
        message: "Cart cleared successfully",
        cart: snapshot.into(),
    }))
}
