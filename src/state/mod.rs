mod access;
mod answer;
pub mod export;
mod game;
pub mod grading;
mod score;
mod song;
mod team;

use crate::protocol::{ServerMessage, SongInfo};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

pub use grading::AnswerObserved;
pub use score::compute_awards;

/// A field the auto-grader must not touch again
pub type GradedField = (SongId, TeamId, AnswerField);

/// Shared application state
///
/// Lock order when more than one lock is held:
/// game -> songs -> teams -> answers -> graded_fields
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<RwLock<Option<GameState>>>,
    pub teams: Arc<RwLock<Vec<Team>>>,
    pub songs: Arc<RwLock<Vec<Song>>>,
    pub answers: Arc<RwLock<HashMap<(SongId, TeamId), Answer>>>,
    pub access_codes: Arc<RwLock<AccessCodes>>,
    /// Fields already graded (automatically or by hand)
    pub graded_fields: Arc<RwLock<HashSet<GradedField>>>,
    /// Config applied to new and reset games
    pub default_config: GameConfig,
    /// Broadcast channel for messages to all clients
    pub broadcast: broadcast::Sender<ServerMessage>,
    /// Broadcast channel for Admin-only messages
    pub admin_broadcast: broadcast::Sender<ServerMessage>,
    /// Broadcast channel for Display-only messages
    pub display_broadcast: broadcast::Sender<ServerMessage>,
    /// Answers that may need auto-grading; consumers must tolerate redelivery
    pub answer_events: broadcast::Sender<AnswerObserved>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_defaults(GameConfig::default(), AccessCodes::default())
    }

    pub fn with_defaults(default_config: GameConfig, access_codes: AccessCodes) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let (admin_tx, _admin_rx) = broadcast::channel(100);
        let (display_tx, _display_rx) = broadcast::channel(100);
        let (answer_tx, _answer_rx) = broadcast::channel(256);
        Self {
            game: Arc::new(RwLock::new(None)),
            teams: Arc::new(RwLock::new(Vec::new())),
            songs: Arc::new(RwLock::new(default_songs())),
            answers: Arc::new(RwLock::new(HashMap::new())),
            access_codes: Arc::new(RwLock::new(access_codes)),
            graded_fields: Arc::new(RwLock::new(HashSet::new())),
            default_config,
            broadcast: tx,
            admin_broadcast: admin_tx,
            display_broadcast: display_tx,
            answer_events: answer_tx,
        }
    }

    /// Send to all connected clients
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // No receivers connected is fine
        let _ = self.broadcast.send(msg);
    }

    pub fn broadcast_to_admin(&self, msg: ServerMessage) {
        let _ = self.admin_broadcast.send(msg);
    }

    pub fn broadcast_to_display(&self, msg: ServerMessage) {
        let _ = self.display_broadcast.send(msg);
    }

    /// Build a GameState message for the current game (None if no game)
    pub async fn game_state_message(&self) -> Option<ServerMessage> {
        let game = self.get_game().await?;
        let current_song = self
            .current_song()
            .await
            .map(|song| SongInfo::new(&song, game.is_revealed));
        Some(ServerMessage::GameState { game, current_song })
    }

    pub async fn broadcast_game_state(&self) {
        if let Some(msg) = self.game_state_message().await {
            self.broadcast_to_all(msg);
        }
    }

    pub async fn broadcast_teams(&self) {
        let teams = self.get_teams().await;
        self.broadcast_to_all(ServerMessage::Teams { teams });
    }

    /// Push the answer list of a song to Admin clients
    pub async fn broadcast_answers_to_admin(&self, song_id: SongId) {
        let answers = self.get_answers_for_song(song_id).await;
        self.broadcast_to_admin(ServerMessage::Answers { song_id, answers });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_state_has_default_catalog() {
        let state = AppState::new();
        assert_eq!(state.get_songs().await.len(), 3);
        assert!(state.get_game().await.is_none());
        assert!(state.get_teams().await.is_empty());
    }

    #[tokio::test]
    async fn test_game_state_message_hides_answer_before_reveal() {
        let state = AppState::new();
        assert!(state.game_state_message().await.is_none());

        state.create_game().await;
        match state.game_state_message().await {
            Some(ServerMessage::GameState { game, current_song }) => {
                assert_eq!(game.current_song_id, 1);
                let song = current_song.expect("current song");
                assert!(song.title_original.is_none());
            }
            other => panic!("Expected GameState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_receivers_is_ignored() {
        let state = AppState::new();
        state.create_game().await;
        state.broadcast_game_state().await;
        state.broadcast_teams().await;
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let state = AppState::new();
        state.create_game().await;
        let mut rx = state.broadcast.subscribe();

        state.broadcast_teams().await;

        match rx.recv().await {
            Ok(ServerMessage::Teams { teams }) => assert!(teams.is_empty()),
            other => panic!("Expected Teams, got {:?}", other),
        }
    }
}
