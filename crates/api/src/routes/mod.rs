//! Route handlers.

pub mod cache_admin;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod ws;

use axum::Json;
use axum::http::{HeaderName, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use store::{CommerceStore, Page};

use crate::AppState;

/// `?page=N` query parameter shared by every listing endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page.unwrap_or(1))
    }
}

pub(crate) const X_CACHE_STATUS: HeaderName = HeaderName::from_static("x-cache-status");

/// Looks up a cached response body. Backend failures degrade to a miss.
pub(crate) async fn cache_get<S: CommerceStore>(state: &AppState<S>, key: &str) -> Option<Value> {
    match state.cache.get(key).await {
        Ok(Some(value)) => {
            ::metrics::counter!("cache_hits_total").increment(1);
            Some(value)
        }
        Ok(None) => {
            ::metrics::counter!("cache_misses_total").increment(1);
            None
        }
        Err(err) => {
            tracing::warn!(%err, key, "cache read failed");
            None
        }
    }
}

/// Stores a response body with the configured expiry. Failures are logged.
pub(crate) async fn cache_put<S: CommerceStore>(state: &AppState<S>, key: &str, value: Value) {
    if let Err(err) = state.cache.set(key, value, state.cache_ttl).await {
        tracing::warn!(%err, key, "cache write failed");
    }
}

/// Wraps a cacheable body with the cache headers.
pub(crate) fn cached_response(value: Value, cache_status: &'static str) -> Response {
    (
        [
            (header::CACHE_CONTROL, "public, max-age=3600"),
            (X_CACHE_STATUS, cache_status),
        ],
        Json(value),
    )
        .into_response()
}
