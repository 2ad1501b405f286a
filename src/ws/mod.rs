mod admin;
pub mod handlers;
mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::SplitSink, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage, SongInfo};
use crate::state::AppState;
use crate::types::Role;

pub const PROTOCOL_VERSION: &str = "1.0";

/// `?role=<role>&code=<code>`; the code is checked by the access middleware
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(role) = params.role.as_deref().and_then(Role::parse) else {
        return (StatusCode::BAD_REQUEST, "Unknown role").into_response();
    };
    tracing::info!("WebSocket connection request: role={:?}", role);

    ws.on_upgrade(move |socket| handle_socket(socket, role, state))
}

type WsSender = SplitSink<WebSocket, Message>;

/// Serialize and send one message; false once the socket is gone
async fn send_message(sender: &mut WsSender, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Messages sent right after connecting
async fn initial_messages(state: &AppState, role: Role) -> Vec<ServerMessage> {
    // Ensure a game exists
    let game = match state.get_game().await {
        Some(g) => g,
        None => {
            tracing::warn!("No game found, creating one");
            state.create_game().await
        }
    };

    let current_song = state
        .current_song()
        .await
        .map(|song| SongInfo::new(&song, game.is_revealed));
    let song_id = game.current_song_id;

    let mut messages = vec![ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role,
        game,
        teams: state.get_teams().await,
        current_song,
        server_now: chrono::Utc::now().to_rfc3339(),
    }];

    if role == Role::Admin {
        messages.push(ServerMessage::Songs {
            songs: state.get_songs().await,
        });
        messages.push(ServerMessage::Answers {
            song_id,
            answers: state.get_answers_for_song(song_id).await,
        });
        messages.push(ServerMessage::AccessCodes {
            codes: state.get_access_codes().await,
        });
    }
    messages
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("WebSocket connected with role: {:?}", role);

    // Subscribe before the welcome so nothing sent in between is lost
    let mut broadcast_rx = state.broadcast.subscribe();
    let mut admin_broadcast_rx = (role == Role::Admin).then(|| state.admin_broadcast.subscribe());
    let mut display_broadcast_rx =
        (role == Role::Display).then(|| state.display_broadcast.subscribe());

    for msg in initial_messages(&state, role).await {
        if !send_message(&mut sender, &msg).await {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    // Handle incoming messages and broadcasts
    loop {
        tokio::select! {
            // Handle general broadcasts (all clients)
            broadcast_msg = broadcast_rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if !send_message(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            // Handle Admin-specific broadcasts
            admin_msg = async {
                match &mut admin_broadcast_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Non-Admin: wait forever
                        std::future::pending::<Option<ServerMessage>>().await
                    }
                }
            } => {
                if let Some(msg) = admin_msg {
                    if !send_message(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            // Handle Display-specific broadcasts
            display_msg = async {
                match &mut display_broadcast_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Non-Display: wait forever
                        std::future::pending::<Option<ServerMessage>>().await
                    }
                }
            } => {
                if let Some(msg) = display_msg {
                    if !send_message(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text.as_str());

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handlers::handle_message(client_msg, &role, &state).await,
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };

                        if let Some(response) = response {
                            if !send_message(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_messages_for_player() {
        let state = AppState::new();
        let messages = initial_messages(&state, Role::Player).await;

        assert_eq!(messages.len(), 1);
        match &messages[0] {
            ServerMessage::Welcome {
                protocol,
                role,
                current_song,
                ..
            } => {
                assert_eq!(protocol, PROTOCOL_VERSION);
                assert_eq!(*role, Role::Player);
                assert!(current_song.as_ref().unwrap().title_original.is_none());
            }
            other => panic!("Expected Welcome, got {:?}", other),
        }
        // Connecting created the game
        assert!(state.get_game().await.is_some());
    }

    #[tokio::test]
    async fn test_initial_messages_for_admin() {
        let state = AppState::new();
        state.create_game().await;
        let messages = initial_messages(&state, Role::Admin).await;

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[1], ServerMessage::Songs { .. }));
        assert!(matches!(messages[2], ServerMessage::Answers { song_id: 1, .. }));
        assert!(matches!(messages[3], ServerMessage::AccessCodes { .. }));
    }
}
