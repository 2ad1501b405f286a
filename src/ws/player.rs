//! Player message handlers
//!
//! Team registration, answer submission and the live extras shown on the
//! Display (typing indicator, emoji reactions).

use crate::error::GameError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::TeamId;
use std::sync::Arc;

/// Emoji with modifiers and ZWJ sequences can span several chars
const MAX_REACTION_CHARS: usize = 8;

fn valid_reaction(emoji: &str) -> bool {
    let count = emoji.chars().count();
    count > 0
        && count <= MAX_REACTION_CHARS
        && !emoji
            .chars()
            .any(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
}

pub async fn handle_register_team(state: &Arc<AppState>, name: String) -> Option<ServerMessage> {
    tracing::info!("Team registration: {}", name);
    match state.register_team(&name).await {
        Ok(team) => {
            state.broadcast_teams().await;
            Some(ServerMessage::TeamRegistered { team })
        }
        Err(e) => Some(ServerMessage::error(&e)),
    }
}

pub async fn handle_submit_answer(
    state: &Arc<AppState>,
    team_id: TeamId,
    title: String,
    artist: String,
) -> Option<ServerMessage> {
    match state.submit_answer(team_id, title, artist).await {
        Ok(answer) => {
            state.broadcast_answers_to_admin(answer.song_id).await;
            state.broadcast_to_display(ServerMessage::Typing {
                team_id,
                is_typing: false,
            });
            Some(ServerMessage::AnswerAccepted {
                song_id: answer.song_id,
            })
        }
        Err(e) => {
            tracing::debug!("Answer from team {} rejected: {}", team_id, e);
            Some(ServerMessage::error(&e))
        }
    }
}

pub async fn handle_typing(
    state: &Arc<AppState>,
    team_id: TeamId,
    is_typing: bool,
) -> Option<ServerMessage> {
    if state.get_team(team_id).await.is_none() {
        return Some(ServerMessage::error(&GameError::TeamNotFound(team_id)));
    }
    state.broadcast_to_display(ServerMessage::Typing { team_id, is_typing });
    None
}

pub async fn handle_react(
    state: &Arc<AppState>,
    team_id: TeamId,
    emoji: String,
) -> Option<ServerMessage> {
    let emoji = emoji.trim().to_string();
    if !valid_reaction(&emoji) {
        return Some(ServerMessage::error(&GameError::InvalidReaction));
    }
    if state.get_team(team_id).await.is_none() {
        return Some(ServerMessage::error(&GameError::TeamNotFound(team_id)));
    }

    state.broadcast_to_display(ServerMessage::Reaction { team_id, emoji });
    None
}
