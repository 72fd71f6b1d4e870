//! Catalog endpoints: cached public reads and admin writes.
//!
//! Every admin write calls the matching cache invalidation before its
//! response is returned; an unreachable cache backend is logged and never
//! fails the write.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use cache::keys;
use chrono::{DateTime, Utc};
use common::{CategoryId, ProductId};
use domain::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};
use serde::{Deserialize, Serialize};
use store::CommerceStore;

use crate::AppState;
use crate::auth::{Identity, Operation, authorize};
use crate::error::ApiError;
use crate::routes::{PageQuery, cache_get, cache_put, cached_response};

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub category_id: CategoryId,
    pub is_active: bool,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price_cents: product.price.cents(),
            stock: product.stock,
            category_id: product.category_id,
            is_active: product.is_active,
            in_stock: product.stock > 0,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct StockUpdateRequest {
    pub stock: u32,
}

fn to_value<T: Serialize>(body: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::Internal(err.to_string()))
}

// -- Public reads --

/// GET /products — cached page of active products.
#[tracing::instrument(skip(state))]
pub async fn list_products<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let page = query.page();
    let key = keys::products_list(page.number());

    if let Some(value) = cache_get(&state, &key).await {
        return Ok(cached_response(value, "HIT"));
    }

    let products = state.store.list_products(true, page).await?;
    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    let value = to_value(&body)?;
    cache_put(&state, &key, value.clone()).await;
    Ok(cached_response(value, "MISS"))
}

/// GET /products/{id} — cached detail of an active product.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Response, ApiError> {
    let key = keys::product_detail(id);

    if let Some(value) = cache_get(&state, &key).await {
        return Ok(cached_response(value, "HIT"));
    }

    let product = state
        .store
        .get_product(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    let value = to_value(&ProductResponse::from(product))?;
    cache_put(&state, &key, value.clone()).await;
    Ok(cached_response(value, "MISS"))
}

/// GET /categories — cached page of categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let page = query.page();
    let key = keys::categories_list(page.number());

    if let Some(value) = cache_get(&state, &key).await {
        return Ok(cached_response(value, "HIT"));
    }

    let categories = state.store.list_categories(page).await?;
    let body: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    let value = to_value(&body)?;
    cache_put(&state, &key, value.clone()).await;
    Ok(cached_response(value, "MISS"))
}

// -- Admin writes --

async fn invalidate_product<S: CommerceStore>(state: &AppState<S>, id: ProductId) {
    if let Err(err) = state.invalidator.invalidate_product(Some(id)).await {
        tracing::warn!(%err, product_id = %id, "product cache invalidation failed");
    }
}

async fn invalidate_category<S: CommerceStore>(state: &AppState<S>, id: CategoryId) {
    if let Err(err) = state.invalidator.invalidate_category(Some(id)).await {
        tracing::warn!(%err, category_id = %id, "category cache invalidation failed");
    }
}

/// POST /admin/products — create a product.
#[tracing::instrument(skip(state, new))]
pub async fn create_product<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    authorize(&identity, Operation::ManageCatalog)?;

    state
        .store
        .get_category(new.category_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Category not found".to_string()))?;

    let product = state.store.insert_product(new).await?;
    invalidate_product(&state, product.id).await;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PATCH /admin/products/{id} — partial product update.
#[tracing::instrument(skip(state, patch))]
pub async fn update_product<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductResponse>, ApiError> {
    authorize(&identity, Operation::ManageCatalog)?;

    let product = state.store.update_product(id, patch).await?;
    invalidate_product(&state, id).await;
    Ok(Json(product.into()))
}

#[derive(Serialize)]
pub struct StockUpdateResponse {
    pub message: String,
    pub product: ProductResponse,
}

/// PATCH /admin/products/{id}/stock — replace a product's stock level.
#[tracing::instrument(skip(state, req))]
pub async fn update_stock<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
    Json(req): Json<StockUpdateRequest>,
) -> Result<Json<StockUpdateResponse>, ApiError> {
    authorize(&identity, Operation::ManageCatalog)?;

    let product = state.store.set_stock(id, req.stock).await?;
    invalidate_product(&state, id).await;
    Ok(Json(StockUpdateResponse {
        message: "Stock updated successfully".to_string(),
        product: product.into(),
    }))
}

/// POST /admin/categories — create a category.
#[tracing::instrument(skip(state, new))]
pub async fn create_category<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    authorize(&identity, Operation::ManageCatalog)?;

    let category = state.store.insert_category(new).await?;
    invalidate_category(&state, category.id).await;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /admin/categories/{id} — cached category detail.
#[tracing::instrument(skip(state))]
pub async fn get_category<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CategoryId>,
) -> Result<Response, ApiError> {
    authorize(&identity, Operation::ManageCatalog)?;

    let key = keys::category_detail(id);
    if let Some(value) = cache_get(&state, &key).await {
        return Ok(cached_response(value, "HIT"));
    }

    let category = state
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    let value = to_value(&CategoryResponse::from(category))?;
    cache_put(&state, &key, value.clone()).await;
    Ok(cached_response(value, "MISS"))
}

/// PATCH /admin/categories/{id} — partial category update.
#[tracing::instrument(skip(state, patch))]
pub async fn update_category<S: CommerceStore>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CategoryId>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<CategoryResponse>, ApiError> {
    authorize(&identity, Operation::ManageCatalog)?;

    let category = state.store.update_category(id, patch).await?;
    invalidate_category(&state, id).await;
    Ok(Json(category.into()))
}
