/// Notification hub
///
/// Keeps the live websocket connections of every signed-in user and routes
/// notification pushes to them. A user may hold several connections.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};

use crate::entities::{NotificationKind, notification};

/// Notification shape pushed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: i32,
    pub kind: NotificationKind,
    pub text: String,
    pub sender_id: i32,
    pub post_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<&notification::Model> for NotificationPayload {
    fn from(model: &notification::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            text: model.text.clone(),
            sender_id: model.sender_id,
            post_id: model.post_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubMessage {
    /// Fresh unread count for the badge
    ReceiveNotification { count: u64, visible: bool },
    /// A single notification to render
    VisualizeNotification { notification: NotificationPayload },
}

pub type HubSender = mpsc::UnboundedSender<HubMessage>;
pub type ConnectionId = u64;

#[derive(Clone, Default)]
pub struct NotificationHub {
    connections: Arc<RwLock<HashMap<i32, Vec<(ConnectionId, HubSender)>>>>,
    next_id: Arc<AtomicU64>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `user_id`; messages arrive on the returned receiver.
    pub async fn subscribe(&self, user_id: i32) -> (ConnectionId, mpsc::UnboundedReceiver<HubMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push((id, tx));
        tracing::debug!(user_id, connection_id = id, "hub connection opened");
        (id, rx)
    }

    pub async fn unsubscribe(&self, user_id: i32, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(senders) = connections.get_mut(&user_id) {
            senders.retain(|(id, _)| *id != connection_id);
            if senders.is_empty() {
                connections.remove(&user_id);
            }
        }
        tracing::debug!(user_id, connection_id, "hub connection closed");
    }

    /// Send to every connection of `user_id`. Closed connections are dropped.
    pub async fn send(&self, user_id: i32, message: HubMessage) {
        let mut connections = self.connections.write().await;
        if let Some(senders) = connections.get_mut(&user_id) {
            senders.retain(|(_, tx)| tx.send(message.clone()).is_ok());
            if senders.is_empty() {
                connections.remove(&user_id);
            }
        }
    }

    /// The pair of messages that follows a new notification.
    pub async fn notify(&self, user_id: i32, unread: u64, notification: &notification::Model) {
        self.send(
            user_id,
            HubMessage::ReceiveNotification {
                count: unread,
                visible: true,
            },
        )
        .await;
        self.send(
            user_id,
            HubMessage::VisualizeNotification {
                notification: NotificationPayload::from(notification),
            },
        )
        .await;
    }

    pub async fn connection_count(&self, user_id: i32) -> usize {
        self.connections
            .read()
            .await
            .get(&user_id)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NotificationStatus;

    fn sample_notification() -> notification::Model {
        notification::Model {
            id: 1,
            recipient_id: 2,
            sender_id: 3,
            kind: NotificationKind::Follow,
            text: "started following you".into(),
            post_id: None,
            status: NotificationStatus::Unread,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_routes_to_every_connection_of_user() {
        let hub = NotificationHub::new();
        let (_, mut first) = hub.subscribe(2).await;
        let (_, mut second) = hub.subscribe(2).await;
        let (_, mut other) = hub.subscribe(9).await;

        hub.notify(2, 4, &sample_notification()).await;

        for rx in [&mut first, &mut second] {
            assert_eq!(
                rx.recv().await,
                Some(HubMessage::ReceiveNotification { count: 4, visible: true })
            );
            match rx.recv().await {
                Some(HubMessage::VisualizeNotification { notification }) => {
                    assert_eq!(notification.id, 1);
                }
                other => panic!("unexpected message: {other:?}"),
            }
        }
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drops_closed_connections() {
        let hub = NotificationHub::new();
        let (_, rx) = hub.subscribe(5).await;
        let (id, _live) = hub.subscribe(5).await;
        drop(rx);

        hub.send(5, HubMessage::ReceiveNotification { count: 1, visible: true }).await;
        assert_eq!(hub.connection_count(5).await, 1);

        hub.unsubscribe(5, id).await;
        assert_eq!(hub.connection_count(5).await, 0);
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_value(HubMessage::ReceiveNotification { count: 2, visible: true }).unwrap();
        assert_eq!(json["type"], "ReceiveNotification");
        assert_eq!(json["count"], 2);
    }
}
