#![allow(dead_code)]

//! Chat session state container — the explicit state machine behind each
//! live chat view.
//!
//! `Loading → Ready` on the initial room-list fetch; `Ready` is further
//! parameterized by the (nullable) current room. The local message list is a
//! read-through cache with no authority of its own: sends are not applied
//! locally, the list grows only when the fan-out echo arrives, and
//! `reconcile` re-fetches from the store after any gap in the subscription.

use std::sync::Arc;

use uuid::Uuid;

use crate::chat::events::ChatEvent;
use crate::chat::realtime::{ChatHub, RoomSubscription};
use crate::chat::store::ChatStore;
use crate::errors::AppError;
use crate::models::chat::{ChatRoom, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

pub struct ChatSession {
    store: Arc<dyn ChatStore>,
    hub: ChatHub,
    user_id: Uuid,
    phase: SessionPhase,
    rooms: Vec<ChatRoom>,
    current_room: Option<Uuid>,
    messages: Vec<Message>,
    subscription: Option<RoomSubscription>,
}

impl ChatSession {
    pub fn new(store: Arc<dyn ChatStore>, hub: ChatHub, user_id: Uuid) -> Self {
        Self {
            store,
            hub,
            user_id,
            phase: SessionPhase::Loading,
            rooms: Vec::new(),
            current_room: None,
            messages: Vec::new(),
            subscription: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn rooms(&self) -> &[ChatRoom] {
        &self.rooms
    }

    pub fn current_room(&self) -> Option<Uuid> {
        self.current_room
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Initial room-list fetch; transitions `Loading → Ready`.
    pub async fn init(&mut self) -> Result<(), AppError> {
        self.rooms = self.store.list_rooms().await?;
        self.phase = SessionPhase::Ready;
        Ok(())
    }

    /// Switches to a room: releases any prior subscription, loads the full
    /// history, then opens a fresh subscription. History-then-subscribe
    /// means an insert racing the switch can be missed; `reconcile` covers
    /// that window.
    pub async fn select_room(&mut self, room_id: Uuid) -> Result<(), AppError> {
        self.subscription = None;
        self.messages.clear();
        self.current_room = None;

        if self.store.room(room_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Room {room_id} not found")));
        }

        self.messages = self.store.room_messages(room_id).await?;
        self.subscription = Some(self.hub.subscribe(room_id).await);
        self.current_room = Some(room_id);
        Ok(())
    }

    /// Sends a message: validates the trimmed body, appends to the store,
    /// and publishes exactly one fan-out event. The local list is NOT
    /// updated here — the sender sees its own message only when the echo
    /// comes back through the subscription.
    pub async fn send(&mut self, body: &str) -> Result<Message, AppError> {
        let room_id = self
            .current_room
            .ok_or_else(|| AppError::Validation("No room selected".to_string()))?;

        if body.trim().is_empty() {
            return Err(AppError::Validation(
                "Message body must not be empty".to_string(),
            ));
        }

        let message = self.store.insert_message(room_id, self.user_id, body).await?;
        self.hub
            .publish(
                room_id,
                ChatEvent::MessageCreated {
                    message: message.clone(),
                },
            )
            .await;
        Ok(message)
    }

    /// Applies a fan-out event to the local list.
    pub fn apply_event(&mut self, event: &ChatEvent) {
        if let ChatEvent::MessageCreated { message } = event {
            if Some(message.room_id) == self.current_room {
                self.messages.push(message.clone());
            }
        }
    }

    /// Replaces the local list with a fresh history fetch. Required after a
    /// reconnect or a lagged subscription — the channel alone is never
    /// trusted to reconstruct state.
    pub async fn reconcile(&mut self) -> Result<(), AppError> {
        let room_id = self
            .current_room
            .ok_or_else(|| AppError::Validation("No room selected".to_string()))?;
        self.messages = self.store.room_messages(room_id).await?;
        Ok(())
    }

    /// Hands the live subscription half to the caller (the WebSocket pump).
    /// Dropping the returned handle still releases the room registration.
    pub fn take_subscription(&mut self) -> Option<RoomSubscription> {
        self.subscription.take()
    }
}
