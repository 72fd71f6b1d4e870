use domain::{CartError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors from the cart and order workflows.
///
/// Cart and order variants are expected, user-facing outcomes and keep
/// their domain messages verbatim; the store variant covers everything
/// infrastructural.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
