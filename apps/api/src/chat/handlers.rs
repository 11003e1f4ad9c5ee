use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use futures_util::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chat::session::ChatSession;
use crate::errors::AppError;
use crate::models::chat::{ChatRoom, DecoratedMessage, Message};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: Uuid,
    pub body: String,
}

/// GET /api/v1/chat/rooms
pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<ChatRoom>>, AppError> {
    Ok(Json(state.store.list_rooms().await?))
}

/// POST /api/v1/chat/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ChatRoom>), AppError> {
    let room = state
        .store
        .create_room(&req.name, req.description.as_deref(), req.is_private)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /api/v1/chat/rooms/:id/messages
///
/// Full ascending history, each message decorated with its sender's profile.
pub async fn room_messages(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<DecoratedMessage>>, AppError> {
    require_room(&state, room_id).await?;

    let messages = state.store.room_messages(room_id).await?;

    let mut sender_ids: Vec<Uuid> = messages.iter().map(|m| m.sender_id).collect();
    sender_ids.sort_unstable();
    sender_ids.dedup();
    let profiles = state.store.profiles_by_ids(&sender_ids).await?;

    let decorated = messages
        .into_iter()
        .map(|message| {
            let profile = profiles.iter().find(|p| p.user_id == message.sender_id);
            DecoratedMessage::new(message, profile)
        })
        .collect();

    Ok(Json(decorated))
}

/// POST /api/v1/chat/rooms/:id/messages
///
/// Insert, then exactly one fan-out publish, then respond with the stored row.
pub async fn send_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    require_room(&state, room_id).await?;

    let message = state
        .store
        .insert_message(room_id, req.sender_id, &req.body)
        .await?;

    state
        .hub
        .publish(
            room_id,
            crate::chat::events::ChatEvent::MessageCreated {
                message: message.clone(),
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn require_room(state: &AppState, room_id: Uuid) -> Result<(), AppError> {
    state
        .store
        .room(room_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Room {room_id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Sender identity for messages sent over this socket. Anonymous
    /// connections get a throwaway identity.
    pub user_id: Option<Uuid>,
}

/// Commands accepted from the client over a room socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data")]
enum ClientCommand {
    SendMessage { body: String },
    Reconcile,
}

/// Frames pushed to the client that are not live hub events.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
enum SessionFrame<'a> {
    History { messages: &'a [Message] },
}

/// GET /api/v1/chat/rooms/:id/ws
///
/// Live chat session: replays history as a backlog frame, then streams
/// fan-out events; accepts `SendMessage` and `Reconcile` commands.
pub async fn room_ws(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    require_room(&state, room_id).await?;

    let user_id = query.user_id.unwrap_or_else(Uuid::new_v4);
    Ok(ws.on_upgrade(move |socket| run_room_socket(state, socket, room_id, user_id)))
}

async fn run_room_socket(state: AppState, socket: WebSocket, room_id: Uuid, user_id: Uuid) {
    let mut session = ChatSession::new(state.store.clone(), state.hub.clone(), user_id);
    if let Err(e) = session.init().await {
        warn!("chat session init failed: {e}");
        return;
    }
    if let Err(e) = session.select_room(room_id).await {
        warn!("chat session could not enter room {room_id}: {e}");
        return;
    }
    let Some(mut subscription) = session.take_subscription() else {
        return;
    };

    let (mut sender, mut receiver) = socket.split();

    if send_history(&mut sender, session.messages()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                session.apply_event(&event);
                let Ok(frame) = serde_json::to_string(&event) else { continue };
                if sender.send(WsMessage::Text(frame)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(ClientCommand::SendMessage { body }) => {
                                if let Err(e) = session.send(&body).await {
                                    warn!("send over room socket rejected: {e}");
                                }
                            }
                            Ok(ClientCommand::Reconcile) => {
                                if session.reconcile().await.is_err()
                                    || send_history(&mut sender, session.messages()).await.is_err()
                                {
                                    break;
                                }
                            }
                            Err(e) => debug!("unparseable client frame: {e}"),
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("room socket error: {e}");
                        break;
                    }
                }
            }
        }
    }
    // subscription and session drop here, releasing the room registration
}

async fn send_history(
    sender: &mut (impl Sink<WsMessage, Error = axum::Error> + Unpin),
    messages: &[Message],
) -> Result<(), axum::Error> {
    let frame = serde_json::to_string(&SessionFrame::History { messages })
        .unwrap_or_else(|_| String::from("{\"type\":\"History\",\"data\":{\"messages\":[]}}"));
    sender.send(WsMessage::Text(frame)).await
}

/// GET /api/v1/chat/feed/ws
///
/// Global feed of webhook broadcasts.
pub async fn feed_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_feed_socket(state, socket))
}

async fn run_feed_socket(state: AppState, socket: WebSocket) {
    let mut feed = state.hub.subscribe_feed();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = feed.recv() => {
                let Some(event) = event else { break };
                let Ok(frame) = serde_json::to_string(&event) else { continue };
                if sender.send(WsMessage::Text(frame)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
