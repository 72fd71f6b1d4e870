//! Persistence layer for the commerce backend.
//!
//! The [`CommerceStore`] trait is the seam between the workflow crates and
//! storage. Two implementations are provided: [`InMemoryStore`] for tests
//! and default wiring, and [`PostgresStore`] backed by sqlx.
//!
//! The store owns the two consistency-critical primitives:
//! [`CommerceStore::try_decrement_stock`] (atomic per-product
//! check-then-set) and [`CommerceStore::commit_order`] (all-or-nothing
//! order insert + stock decrements + cart clear).

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CommerceStore, Page};
