//! Cart and order workflows.
//!
//! [`CartService`] owns the mutable pre-purchase cart; [`CheckoutService`]
//! converts a cart into an immutable order under the store's transactional
//! guarantee and drives post-commit cache invalidation and notification
//! fan-out. Collaborators (store, cache, notifier) are injected at
//! construction so both services can be tested against fakes.

mod cart;
mod error;
mod order;

pub use cart::CartService;
pub use error::CheckoutError;
pub use order::CheckoutService;
