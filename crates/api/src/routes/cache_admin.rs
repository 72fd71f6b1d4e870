//! Cache administration endpoints (admin only).

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{CategoryId, ProductId};
use serde::Deserialize;
use serde_json::{Value, json};
use store::CommerceStore;

use crate::AppState;
use crate::auth::{Identity, Operation, authorize};
use crate::error::ApiError;

#[derive(Deserialize, Default)]
pub struct InvalidateProductsRequest {
    pub product_id: Option<ProductId>,
}

#[derive(Deserialize, Default)]
pub struct InvalidateCategoriesRequest {
    pub category_id: Option<CategoryId>,
}

/// GET /admin/cache/stats — backend statistics.
///
/// Degrades to an explicit "unavailable" payload when the backend is
/// unreachable instead of failing the request.
#[tracing::instrument(skip(state, identity))]
pub async fn stats<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    authorize(&identity, Operation::ManageCache)?;

    let stats = match state.invalidator.stats().await {
        Ok(stats) => json!(stats),
        Err(err) => {
            tracing::warn!(%err, "cache stats unavailable");
            json!({ "error": "Cache stats not available" })
        }
    };

    Ok(Json(json!({
        "cache_stats": stats,
        "cache_ttl_seconds": state.cache_ttl.as_secs(),
    })))
}

/// POST /admin/cache/clear — drop every cached entry.
#[tracing::instrument(skip(state, identity))]
pub async fn clear<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    authorize(&identity, Operation::ManageCache)?;

    state
        .invalidator
        .clear_all()
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to clear cache: {err}")))?;

    Ok(Json(json!({ "message": "All cache cleared successfully" })))
}

/// POST /admin/cache/invalidate-products — targeted product invalidation.
#[tracing::instrument(skip(state, identity, req))]
pub async fn invalidate_products<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<InvalidateProductsRequest>,
) -> Result<Json<Value>, ApiError> {
    authorize(&identity, Operation::ManageCache)?;

    state
        .invalidator
        .invalidate_product(req.product_id)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to invalidate product cache: {err}")))?;

    Ok(Json(json!({ "message": "Product cache invalidated successfully" })))
}

/// POST /admin/cache/invalidate-categories — targeted category invalidation.
#[tracing::instrument(skip(state, identity, req))]
pub async fn invalidate_categories<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<InvalidateCategoriesRequest>,
) -> Result<Json<Value>, ApiError> {
    authorize(&identity, Operation::ManageCache)?;

    state
        .invalidator
        .invalidate_category(req.category_id)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to invalidate category cache: {err}")))?;

    Ok(Json(json!({ "message": "Category cache invalidated successfully" })))
}
