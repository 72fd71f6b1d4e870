//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::CartError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Conflict outcomes (insufficient stock, empty cart, invalid status
/// transition) are reported as 400s with their domain message verbatim;
/// infrastructure failures are the only 500s.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed identity.
    Unauthorized(String),
    /// Identity known, operation not permitted for its role.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client, including business conflicts.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Cart(CartError::ProductNotFound | CartError::ItemNotFound) => {
                ApiError::NotFound(err.to_string())
            }
            CheckoutError::Cart(_) | CheckoutError::Order(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CheckoutError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::StockConflict { .. } => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::{OrderError, OrderStatus};

    use super::*;

    #[test]
    fn conflicts_map_to_bad_request() {
        let err: ApiError = CheckoutError::Order(OrderError::EmptyCart).into();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Cart is empty"));

        let err: ApiError = CheckoutError::Order(OrderError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        })
        .into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn missing_entities_map_to_not_found() {
        let err: ApiError = CheckoutError::Cart(CartError::ItemNotFound).into();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Cart item not found"));

        let err: ApiError = StoreError::not_found("Order", "x").into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
