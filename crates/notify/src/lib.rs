//! Real-time notification fan-out.
//!
//! Domain events are pushed to logical channels: one per user
//! (`user_{id}`) and one shared admin channel (`admin_orders`). Delivery
//! is best-effort and at-most-once per connected subscriber; there is no
//! history or replay, and nothing here may block or fail the business
//! operation that emitted the event.
//!
//! Workflows never publish directly: they enqueue onto a bounded outbound
//! queue through a [`Notifier`] handle, and a dispatcher task drains the
//! queue into the [`ChannelHub`]. A full queue drops the event (logged and
//! counted), which is an accepted loss mode.

mod event;
mod hub;
mod queue;

pub use event::{Channel, NotificationEvent};
pub use hub::ChannelHub;
pub use queue::{Notifier, spawn_dispatcher, spawn_dispatcher_with_capacity};
