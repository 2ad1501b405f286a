//! State export/import for restoring a quiz night after a restart.
//!
//! The snapshot holds everything a running quiz needs except the broadcast
//! channels and the access codes, which come from the server config.

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Schema version for export format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateExport {
    pub schema_version: u32,
    /// Export timestamp (RFC3339)
    pub exported_at: String,
    pub game: Option<GameState>,
    #[serde(default)]
    pub teams: Vec<Team>,
    pub songs: Vec<Song>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl GameStateExport {
    /// Validate the export before import
    pub fn validate(&self) -> GameResult<()> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(GameError::Import(format!(
                "schema version {} is newer than supported version {}",
                self.schema_version, EXPORT_SCHEMA_VERSION
            )));
        }

        let song_ids: HashSet<SongId> = self.songs.iter().map(|s| s.id).collect();
        if song_ids.is_empty() || song_ids.len() != self.songs.len() {
            return Err(GameError::Import(
                "song catalog is empty or has duplicate ids".to_string(),
            ));
        }

        let mut team_ids = HashSet::new();
        for team in &self.teams {
            if !team_ids.insert(team.id) {
                return Err(GameError::Import(format!("duplicate team id {}", team.id)));
            }
        }

        let mut seen = HashSet::new();
        for answer in &self.answers {
            if !seen.insert((answer.song_id, answer.team_id)) {
                return Err(GameError::Import(format!(
                    "team {} has more than one answer for song {}",
                    answer.team_id, answer.song_id
                )));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> GameStateExport {
        GameStateExport {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            game: self.get_game().await,
            teams: self.get_teams().await,
            songs: self.get_songs().await,
            answers: self.get_all_answers().await,
        }
    }

    /// Replace all state with a snapshot.
    ///
    /// Fields that already carry a grade go back into the grading ledger;
    /// answers with pending fields are handed to the auto-grader again.
    pub async fn import_state(&self, export: GameStateExport) -> GameResult<()> {
        export.validate()?;

        {
            let mut game = self.game.write().await;
            let mut songs = self.songs.write().await;
            let mut teams = self.teams.write().await;
            let mut answers = self.answers.write().await;
            let mut graded = self.graded_fields.write().await;

            *game = export.game.map(|mut g| {
                g.version += 1;
                g
            });
            *songs = export.songs;
            *teams = export.teams;

            answers.clear();
            graded.clear();
            for answer in export.answers {
                for field in AnswerField::ALL {
                    if !answer.grade(field).is_pending() {
                        graded.insert((answer.song_id, answer.team_id, field));
                    }
                }
                answers.insert((answer.song_id, answer.team_id), answer);
            }
        }

        let pending = self.republish_pending().await;
        tracing::info!("State imported, {} answer(s) queued for grading", pending);

        self.broadcast_game_state().await;
        self.broadcast_teams().await;
        self.broadcast_to_admin(ServerMessage::Songs {
            songs: self.get_songs().await,
        });
        if let Some(game) = self.get_game().await {
            self.broadcast_answers_to_admin(game.current_song_id).await;
        }
        Ok(())
    }
}
