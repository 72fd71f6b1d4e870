//! WebSocket notification endpoints.
//!
//! A customer connection subscribes to its own `user_{id}` channel; an
//! admin connection subscribes to the shared `admin_orders` channel and
//! is refused before the upgrade if the caller is not an admin. There is
//! no replay: a connection only sees events published while it is open.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use notify::NotificationEvent;
use serde_json::{Value, json};
use store::CommerceStore;
use tokio::sync::broadcast;

use crate::AppState;
use crate::auth::{Identity, Operation, authorize};
use crate::error::ApiError;

/// GET /ws/orders — per-user notification channel.
#[tracing::instrument(skip(state, ws, identity))]
pub async fn customer<S: CommerceStore + 'static>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    authorize(&identity, Operation::SubscribeOrders)?;

    let rx = state.hub.subscribe_user(identity.user_id).await;
    let greeting = json!({
        "type": "connection_established",
        "message": "Connected to order notifications",
        "user_id": identity.user_id,
    });
    Ok(ws.on_upgrade(move |socket| run_socket(socket, rx, greeting)))
}

/// GET /ws/admin/orders — shared admin notification channel.
#[tracing::instrument(skip(state, ws, identity))]
pub async fn admin<S: CommerceStore + 'static>(
    identity: Identity,
    State(state): State<Arc<AppState<S>>>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    authorize(&identity, Operation::SubscribeAdminOrders)?;

    let rx = state.hub.subscribe_admin();
    let greeting = json!({
        "type": "connection_established",
        "message": "Connected to admin order notifications",
        "user_id": identity.user_id,
    });
    Ok(ws.on_upgrade(move |socket| run_socket(socket, rx, greeting)))
}

/// Drives one connection: forwards channel events outward and answers the
/// small inbound protocol (ping, subscribe ack) until either side closes.
async fn run_socket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<NotificationEvent>,
    greeting: Value,
) {
    let (mut sender, mut receiver) = socket.split();

    if sender
        .send(Message::Text(greeting.to_string().into()))
        .await
        .is_err()
    {
        return;
    }
    tracing::debug!("websocket client connected");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Slow consumer; intervening events are lost for it.
                    tracing::debug!(skipped, "websocket subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_client_message(&text) {
                        if sender
                            .send(Message::Text(reply.to_string().into()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("websocket client disconnected");
}

/// Handles one inbound client frame, returning the reply to send, if any.
fn handle_client_message(text: &str) -> Option<Value> {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return Some(json!({
            "type": "error",
            "message": "Invalid JSON format",
        }));
    };

    match value.get("type").and_then(Value::as_str) {
        Some("ping") => Some(json!({
            "type": "pong",
            "message": "pong",
        })),
        Some("subscribe_orders") => Some(json!({
            "type": "subscription_confirmed",
            "message": "Subscribed to order notifications",
        })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_gets_pong() {
        let reply = handle_client_message(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(reply["type"], "pong");
    }

    #[test]
    fn subscribe_gets_ack() {
        let reply = handle_client_message(r#"{"type":"subscribe_orders"}"#).unwrap();
        assert_eq!(reply["type"], "subscription_confirmed");
    }

    #[test]
    fn invalid_json_gets_error_frame() {
        let reply = handle_client_message("not json").unwrap();
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["message"], "Invalid JSON format");
    }

    #[test]
    fn unknown_types_are_ignored() {
        assert!(handle_client_message(r#"{"type":"other"}"#).is_none());
        assert!(handle_client_message(r#"{"no_type":true}"#).is_none());
    }
}
