#![allow(dead_code)]

//! Realtime fan-out hub — per-room broadcast topics plus a global feed.
//!
//! The hub is a notification layer only: no durability, no replay. Delivery
//! is at-least-once to subscribers that are live at publish time; ordering
//! across concurrent writers is not guaranteed. A subscriber that was
//! disconnected during an insert must re-fetch history to recover.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::warn;
use uuid::Uuid;

use crate::chat::events::ChatEvent;

const TOPIC_CAPACITY: usize = 256;

/// Owns all live fan-out topics. Cheap to clone; shared via `AppState`.
#[derive(Clone)]
pub struct ChatHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    /// Per-room topics, created on first subscribe or publish.
    rooms: RwLock<HashMap<Uuid, broadcast::Sender<ChatEvent>>>,
    /// Global feed carrying webhook broadcasts.
    feed: broadcast::Sender<ChatEvent>,
}

impl ChatHub {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(TOPIC_CAPACITY);
        Self {
            inner: Arc::new(HubInner {
                rooms: RwLock::new(HashMap::new()),
                feed,
            }),
        }
    }

    /// Registers a subscriber for newly published events in `room_id`.
    /// The returned handle unregisters itself when closed or dropped.
    pub async fn subscribe(&self, room_id: Uuid) -> RoomSubscription {
        let mut rooms = self.inner.rooms.write().await;
        let tx = rooms
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0);
        RoomSubscription {
            room_id,
            rx: tx.subscribe(),
        }
    }

    /// Delivers `event` to every current subscriber of `room_id`.
    /// Topics with no remaining subscribers are pruned.
    pub async fn publish(&self, room_id: Uuid, event: ChatEvent) {
        let mut rooms = self.inner.rooms.write().await;
        if let Some(tx) = rooms.get(&room_id) {
            if tx.send(event).is_err() {
                // Last receiver is gone; drop the topic.
                rooms.remove(&room_id);
            }
        }
    }

    /// Number of live subscribers for a room.
    pub async fn room_subscribers(&self, room_id: Uuid) -> usize {
        self.inner
            .rooms
            .read()
            .await
            .get(&room_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Registers a subscriber on the global webhook feed.
    pub fn subscribe_feed(&self) -> FeedSubscription {
        FeedSubscription {
            rx: self.inner.feed.subscribe(),
        }
    }

    /// Broadcasts onto the global feed. Subscriber absence is not an error.
    pub fn publish_feed(&self, event: ChatEvent) {
        let _ = self.inner.feed.send(event);
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration on a room topic. Dropping (or `close()`ing) the
/// handle releases the registration; holding it past the consuming view's
/// lifetime would leak a listener that keeps firing into stale state.
pub struct RoomSubscription {
    room_id: Uuid,
    rx: broadcast::Receiver<ChatEvent>,
}

impl RoomSubscription {
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Waits for the next event on this topic. Returns `None` once the hub
    /// side is gone. A lagged receiver skips ahead: the missed events are
    /// only recoverable by re-fetching history.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        room_id = %self.room_id,
                        missed, "subscription lagged; events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Explicitly releases the registration.
    pub fn close(self) {}
}

/// A live registration on the global feed.
pub struct FeedSubscription {
    rx: broadcast::Receiver<ChatEvent>,
}

impl FeedSubscription {
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "feed subscription lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Message;
    use chrono::Utc;

    fn message_in(room_id: Uuid, body: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            room_id,
            sender_id: Uuid::new_v4(),
            body: body.to_string(),
            kind: "text".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_observes_insert_into_its_room() {
        let hub = ChatHub::new();
        let r1 = Uuid::new_v4();

        let mut sub = hub.subscribe(r1).await;
        hub.publish(
            r1,
            ChatEvent::MessageCreated {
                message: message_in(r1, "hello"),
            },
        )
        .await;

        match sub.recv().await {
            Some(ChatEvent::MessageCreated { message }) => assert_eq!(message.body, "hello"),
            other => panic!("expected MessageCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let hub = ChatHub::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();

        let mut sub_a = hub.subscribe(room_a).await;
        let _sub_b = hub.subscribe(room_b).await;

        hub.publish(
            room_b,
            ChatEvent::MessageCreated {
                message: message_in(room_b, "for b only"),
            },
        )
        .await;
        hub.publish(
            room_a,
            ChatEvent::MessageCreated {
                message: message_in(room_a, "for a"),
            },
        )
        .await;

        // The first event sub_a sees is room_a's, not room_b's.
        match sub_a.recv().await {
            Some(ChatEvent::MessageCreated { message }) => {
                assert_eq!(message.room_id, room_a);
                assert_eq!(message.body, "for a");
            }
            other => panic!("expected MessageCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_every_live_subscriber_is_notified() {
        let hub = ChatHub::new();
        let room = Uuid::new_v4();

        let mut first = hub.subscribe(room).await;
        let mut second = hub.subscribe(room).await;

        hub.publish(
            room,
            ChatEvent::MessageCreated {
                message: message_in(room, "fan-out"),
            },
        )
        .await;

        assert!(first.recv().await.is_some());
        assert!(second.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_dropping_subscription_releases_registration() {
        let hub = ChatHub::new();
        let room = Uuid::new_v4();

        let sub = hub.subscribe(room).await;
        assert_eq!(hub.room_subscribers(room).await, 1);

        sub.close();
        assert_eq!(hub.room_subscribers(room).await, 0);

        // Publishing into an empty topic prunes it without error.
        hub.publish(
            room,
            ChatEvent::MessageCreated {
                message: message_in(room, "nobody listening"),
            },
        )
        .await;
        assert_eq!(hub.room_subscribers(room).await, 0);
    }

    #[tokio::test]
    async fn test_feed_carries_webhook_broadcasts() {
        let hub = ChatHub::new();
        let mut feed = hub.subscribe_feed();

        hub.publish_feed(ChatEvent::WebhookMessage {
            message: crate::models::webhook::WebhookChatMessage::from_payload(
                None,
                "ping".to_string(),
                None,
                None,
                None,
            ),
            ai_response: None,
        });

        match feed.recv().await {
            Some(ChatEvent::WebhookMessage { message, .. }) => assert_eq!(message.message, "ping"),
            other => panic!("expected WebhookMessage, got {other:?}"),
        }
    }
}
