use std::collections::HashMap;

use common::UserId;
use tokio::sync::{RwLock, broadcast};

use crate::event::{Channel, NotificationEvent};

/// Default buffer size for each broadcast channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Registry of live notification channels.
///
/// Each user channel is a broadcast sender created on first subscribe;
/// the admin channel always exists. Publishing to a channel with no
/// subscribers delivers to nobody, which is the expected no-replay
/// semantics, and prunes the dead user entry.
pub struct ChannelHub {
    users: RwLock<HashMap<UserId, broadcast::Sender<NotificationEvent>>>,
    admin: broadcast::Sender<NotificationEvent>,
    capacity: usize,
}

impl ChannelHub {
    /// Creates a hub with the given per-channel buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (admin, _) = broadcast::channel(capacity);
        Self {
            users: RwLock::new(HashMap::new()),
            admin,
            capacity,
        }
    }

    /// Creates a hub with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Subscribes to one user's channel, creating it if needed.
    pub async fn subscribe_user(&self, user_id: UserId) -> broadcast::Receiver<NotificationEvent> {
        let mut users = self.users.write().await;
        users
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Subscribes to the shared admin channel.
    pub fn subscribe_admin(&self) -> broadcast::Receiver<NotificationEvent> {
        self.admin.subscribe()
    }

    /// Pushes an event to every current subscriber of `channel`.
    ///
    /// Returns how many subscribers received it; zero is not an error.
    pub async fn publish(&self, channel: Channel, event: NotificationEvent) -> usize {
        match channel {
            Channel::Admin => self.admin.send(event).unwrap_or(0),
            Channel::User(user_id) => {
                let mut users = self.users.write().await;
                let Some(sender) = users.get(&user_id) else {
                    return 0;
                };
                match sender.send(event) {
                    Ok(delivered) => delivered,
                    Err(_) => {
                        // Last receiver is gone; drop the channel entry.
                        users.remove(&user_id);
                        0
                    }
                }
            }
        }
    }

    /// Number of live subscribers on a channel.
    pub async fn subscriber_count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Admin => self.admin.receiver_count(),
            Channel::User(user_id) => {
                let users = self.users.read().await;
                users.get(&user_id).map_or(0, |s| s.receiver_count())
            }
        }
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;

    use super::*;

    #[tokio::test]
    async fn publish_reaches_user_subscriber() {
        let hub = ChannelHub::new();
        let user_id = UserId::new();
        let mut rx = hub.subscribe_user(user_id).await;

        let event = NotificationEvent::order_created(OrderId::new());
        let delivered = hub.publish(Channel::User(user_id), event.clone()).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_lost() {
        let hub = ChannelHub::new();
        let delivered = hub
            .publish(
                Channel::User(UserId::new()),
                NotificationEvent::order_created(OrderId::new()),
            )
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn user_channels_are_isolated() {
        let hub = ChannelHub::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let mut alice_rx = hub.subscribe_user(alice).await;
        let mut bob_rx = hub.subscribe_user(bob).await;

        hub.publish(
            Channel::User(alice),
            NotificationEvent::order_created(OrderId::new()),
        )
        .await;

        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn admin_channel_fans_out_to_all_admins() {
        let hub = ChannelHub::new();
        let mut rx1 = hub.subscribe_admin();
        let mut rx2 = hub.subscribe_admin();

        let event = NotificationEvent::new_order(OrderId::new(), UserId::new());
        let delivered = hub.publish(Channel::Admin, event.clone()).await;

        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn dropped_subscriber_prunes_user_channel() {
        let hub = ChannelHub::new();
        let user_id = UserId::new();
        let rx = hub.subscribe_user(user_id).await;
        drop(rx);

        let delivered = hub
            .publish(
                Channel::User(user_id),
                NotificationEvent::order_created(OrderId::new()),
            )
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(hub.subscriber_count(Channel::User(user_id)).await, 0);
    }
}
