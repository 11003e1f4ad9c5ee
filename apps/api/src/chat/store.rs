//! Persisted message store — the single source of truth for rooms and
//! messages. The fan-out hub is purely a notification layer on top of it.
//!
//! The store sits behind a trait so the session state machine can be tested
//! against an in-memory double without a live database.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chat::{ChatRoom, Message, Profile};

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_room(
        &self,
        name: &str,
        description: Option<&str>,
        is_private: bool,
    ) -> Result<ChatRoom, AppError>;

    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, AppError>;

    async fn room(&self, room_id: Uuid) -> Result<Option<ChatRoom>, AppError>;

    /// Appends a message. The store assigns the identifier and timestamp.
    /// Fails with a validation error when the body is empty after trimming.
    async fn insert_message(
        &self,
        room_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, AppError>;

    /// Full history for a room, ordered by creation time ascending, oldest
    /// first. Unpaginated — an acknowledged limitation carried over from the
    /// original contract, not a feature.
    async fn room_messages(&self, room_id: Uuid) -> Result<Vec<Message>, AppError>;

    /// Batch-resolves sender profiles for display decoration.
    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, AppError>;
}

fn normalized_body(body: &str) -> Result<&str, AppError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Message body must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// PostgreSQL-backed store.
pub struct PgChatStore {
    db: PgPool,
}

impl PgChatStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create_room(
        &self,
        name: &str,
        description: Option<&str>,
        is_private: bool,
    ) -> Result<ChatRoom, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Room name must not be empty".to_string(),
            ));
        }

        let room: ChatRoom = sqlx::query_as(
            r#"
            INSERT INTO chat_rooms (name, description, is_private)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, is_private, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(is_private)
        .fetch_one(&self.db)
        .await?;

        Ok(room)
    }

    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, AppError> {
        let rooms: Vec<ChatRoom> = sqlx::query_as(
            "SELECT id, name, description, is_private, created_at FROM chat_rooms ORDER BY created_at",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rooms)
    }

    async fn room(&self, room_id: Uuid) -> Result<Option<ChatRoom>, AppError> {
        let room: Option<ChatRoom> = sqlx::query_as(
            "SELECT id, name, description, is_private, created_at FROM chat_rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(room)
    }

    async fn insert_message(
        &self,
        room_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, AppError> {
        let body = normalized_body(body)?;

        let message: Message = sqlx::query_as(
            r#"
            INSERT INTO messages (room_id, sender_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, room_id, sender_id, body, kind, created_at
            "#,
        )
        .bind(room_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(&self.db)
        .await?;

        Ok(message)
    }

    async fn room_messages(&self, room_id: Uuid) -> Result<Vec<Message>, AppError> {
        let messages: Vec<Message> = sqlx::query_as(
            r#"
            SELECT id, room_id, sender_id, body, kind, created_at
            FROM messages
            WHERE room_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.db)
        .await?;
        Ok(messages)
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let profiles: Vec<Profile> = sqlx::query_as(
            "SELECT user_id, display_name, avatar_url FROM profiles WHERE user_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;
        Ok(profiles)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryChatStore;
    use super::*;

    #[tokio::test]
    async fn test_insert_then_query_returns_message_last() {
        let store = MemoryChatStore::new();
        let room = store.seeded_room("R1").await;
        let sender = Uuid::new_v4();

        store.insert_message(room.id, sender, "first").await.unwrap();
        let inserted = store.insert_message(room.id, sender, "hello").await.unwrap();

        let history = store.room_messages(room.id).await.unwrap();
        assert_eq!(history.last(), Some(&inserted));
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_requerying_without_writes_is_identical() {
        let store = MemoryChatStore::new();
        let room = store.seeded_room("R1").await;
        let sender = Uuid::new_v4();

        for body in ["a", "b", "c"] {
            store.insert_message(room.id, sender, body).await.unwrap();
        }

        let first = store.room_messages(room.id).await.unwrap();
        let second = store.room_messages(room.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let store = MemoryChatStore::new();
        let room = store.seeded_room("R1").await;

        let err = store
            .insert_message(room.id, Uuid::new_v4(), "   \n\t ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_body_is_trimmed_before_storage() {
        let store = MemoryChatStore::new();
        let room = store.seeded_room("R1").await;

        let message = store
            .insert_message(room.id, Uuid::new_v4(), "  hello  ")
            .await
            .unwrap();
        assert_eq!(message.body, "hello");
    }

    #[tokio::test]
    async fn test_messages_are_scoped_to_their_room() {
        let store = MemoryChatStore::new();
        let room_a = store.seeded_room("A").await;
        let room_b = store.seeded_room("B").await;
        let sender = Uuid::new_v4();

        store.insert_message(room_a.id, sender, "in a").await.unwrap();
        store.insert_message(room_b.id, sender, "in b").await.unwrap();

        let history = store.room_messages(room_a.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].body, "in a");
    }
}
