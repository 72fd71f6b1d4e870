//! Domain types for the commerce backend.
//!
//! Catalog entities, the per-user cart, immutable orders with their status
//! state machine, and the domain error taxonomy. Persistence and workflow
//! logic live in the `store` and `checkout` crates.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;
pub mod status;

pub use cart::{CartItemRecord, CartLine, CartSnapshot};
pub use catalog::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};
pub use error::{CartError, OrderError};
pub use order::{Order, OrderDraft, OrderItem};
pub use status::OrderStatus;
