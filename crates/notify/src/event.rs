use chrono::Utc;
use common::{OrderId, UserId};
use domain::OrderStatus;
use serde::{Deserialize, Serialize};

/// A logical pub/sub destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// One user's private channel.
    User(UserId),
    /// The shared channel every connected admin subscribes to.
    Admin,
}

impl Channel {
    /// Returns the channel name.
    pub fn name(&self) -> String {
        match self {
            Channel::User(id) => format!("user_{id}"),
            Channel::Admin => "admin_orders".to_string(),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ephemeral notification pushed to connected subscribers.
///
/// Never persisted; a subscriber that was not connected when the event
/// was published misses it permanently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Sent to the owner when their order is placed.
    OrderCreated {
        order_id: OrderId,
        message: String,
        timestamp: String,
    },

    /// Sent to the owner when their order's status changes.
    OrderUpdate {
        order_id: OrderId,
        old_status: OrderStatus,
        new_status: OrderStatus,
        message: String,
        timestamp: String,
    },

    /// Sent to admins when any order is placed.
    NewOrder {
        order_id: OrderId,
        user_id: UserId,
        message: String,
        timestamp: String,
    },

    /// Sent to admins when any order's status changes.
    OrderStatusChanged {
        order_id: OrderId,
        user_id: UserId,
        old_status: OrderStatus,
        new_status: OrderStatus,
        message: String,
        timestamp: String,
    },
}

impl NotificationEvent {
    /// Builds an `order_created` event for the owning user.
    pub fn order_created(order_id: OrderId) -> Self {
        NotificationEvent::OrderCreated {
            order_id,
            message: format!("Your order #{order_id} has been created successfully!"),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Builds an `order_update` event for the owning user.
    pub fn order_update(order_id: OrderId, old_status: OrderStatus, new_status: OrderStatus) -> Self {
        NotificationEvent::OrderUpdate {
            order_id,
            old_status,
            new_status,
            message: format!("Your order #{order_id} status has been updated to {new_status}"),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Builds a `new_order` event for the admin channel.
    pub fn new_order(order_id: OrderId, user_id: UserId) -> Self {
        NotificationEvent::NewOrder {
            order_id,
            user_id,
            message: format!("New order #{order_id} placed by {user_id}"),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Builds an `order_status_changed` event for the admin channel.
    pub fn order_status_changed(
        order_id: OrderId,
        user_id: UserId,
        old_status: OrderStatus,
        new_status: OrderStatus,
    ) -> Self {
        NotificationEvent::OrderStatusChanged {
            order_id,
            user_id,
            old_status,
            new_status,
            message: format!("Order #{order_id} status changed from {old_status} to {new_status}"),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Returns the wire name of the event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            NotificationEvent::OrderCreated { .. } => "order_created",
            NotificationEvent::OrderUpdate { .. } => "order_update",
            NotificationEvent::NewOrder { .. } => "new_order",
            NotificationEvent::OrderStatusChanged { .. } => "order_status_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names() {
        let user_id = UserId::new();
        assert_eq!(Channel::User(user_id).name(), format!("user_{user_id}"));
        assert_eq!(Channel::Admin.name(), "admin_orders");
    }

    #[test]
    fn order_created_wire_format() {
        let order_id = OrderId::new();
        let event = NotificationEvent::order_created(order_id);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "order_created");
        assert_eq!(json["order_id"], order_id.to_string());
        assert!(json["message"].as_str().unwrap().contains(&order_id.to_string()));
        assert!(json["timestamp"].as_str().is_some());
    }

    #[test]
    fn status_changed_carries_both_statuses() {
        let event = NotificationEvent::order_status_changed(
            OrderId::new(),
            UserId::new(),
            OrderStatus::Pending,
            OrderStatus::Shipped,
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "order_status_changed");
        assert_eq!(json["old_status"], "pending");
        assert_eq!(json["new_status"], "shipped");
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let event = NotificationEvent::order_update(
            OrderId::new(),
            OrderStatus::Pending,
            OrderStatus::Shipped,
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }
}
