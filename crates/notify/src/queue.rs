use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::event::{Channel, NotificationEvent};
use crate::hub::ChannelHub;

/// Default capacity of the outbound queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// An event waiting to be fanned out.
#[derive(Debug, Clone)]
struct OutboundEvent {
    channel: Channel,
    event: NotificationEvent,
}

/// Cheap handle workflows use to emit notifications.
///
/// `enqueue` never blocks and never fails the caller: a full or closed
/// queue logs the loss and increments a counter. The single queue also
/// preserves enqueue order, so a workflow's user event is always
/// published before its paired admin event.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<OutboundEvent>,
}

impl Notifier {
    /// Enqueues an event for delivery to `channel`.
    pub fn enqueue(&self, channel: Channel, event: NotificationEvent) {
        let kind = event.event_type();
        match self.tx.try_send(OutboundEvent { channel, event }) {
            Ok(()) => {
                metrics::counter!("notifications_enqueued_total", "kind" => kind).increment(1);
            }
            Err(err) => {
                metrics::counter!("notifications_dropped_total", "kind" => kind).increment(1);
                tracing::warn!(kind, %err, "outbound notification dropped");
            }
        }
    }
}

/// Spawns the dispatcher task draining the outbound queue into the hub.
///
/// Returns the enqueue handle and the task handle; the task ends when the
/// last `Notifier` is dropped.
pub fn spawn_dispatcher(hub: Arc<ChannelHub>) -> (Notifier, JoinHandle<()>) {
    spawn_dispatcher_with_capacity(hub, DEFAULT_QUEUE_CAPACITY)
}

/// Same as [`spawn_dispatcher`] with an explicit queue capacity.
pub fn spawn_dispatcher_with_capacity(
    hub: Arc<ChannelHub>,
    capacity: usize,
) -> (Notifier, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<OutboundEvent>(capacity);

    let handle = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let kind = outbound.event.event_type();
            let channel = outbound.channel;
            let delivered = hub.publish(channel, outbound.event).await;
            if delivered == 0 {
                tracing::debug!(kind, %channel, "no subscribers connected");
            } else {
                metrics::counter!("notifications_delivered_total", "kind" => kind)
                    .increment(delivered as u64);
            }
        }
    });

    (Notifier { tx }, handle)
}
