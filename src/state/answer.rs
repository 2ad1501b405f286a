//! Answer submission and manual grading

use super::{AnswerObserved, AppState};
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Submit a team's guess for the current song.
    ///
    /// A team answers each song once; the stored answer is locked.
    pub async fn submit_answer(
        &self,
        team_id: TeamId,
        title: String,
        artist: String,
    ) -> GameResult<Answer> {
        let title = title.trim().to_string();
        let artist = artist.trim().to_string();
        if title.is_empty() || artist.is_empty() {
            return Err(GameError::EmptyAnswer);
        }

        // Hold the game lock until the answer is stored so a reveal cannot
        // slip in between the checks and the insert
        let game_guard = self.game.read().await;
        let game = game_guard.as_ref().ok_or(GameError::NoActiveGame)?;
        let song_id = game.current_song_id;
        if game.is_revealed {
            return Err(GameError::AlreadyRevealed(song_id));
        }

        let answer = {
            let teams = self.teams.read().await;
            if !teams.iter().any(|t| t.id == team_id) {
                return Err(GameError::TeamNotFound(team_id));
            }

            let mut answers = self.answers.write().await;
            if answers.contains_key(&(song_id, team_id)) {
                return Err(GameError::AnswerLocked { song_id, team_id });
            }

            let answer = Answer {
                id: ulid::Ulid::new().to_string(),
                song_id,
                team_id,
                title,
                artist,
                submitted_at: chrono::Utc::now().to_rfc3339(),
                locked: true,
                title_correct: Grade::Pending,
                artist_correct: Grade::Pending,
            };
            answers.insert((song_id, team_id), answer.clone());
            answer
        };
        drop(game_guard);

        tracing::info!(
            "Team {} answered song {}: '{}' by '{}'",
            team_id,
            song_id,
            answer.title,
            answer.artist
        );
        self.publish_answer_observed(AnswerObserved { song_id, team_id });
        Ok(answer)
    }

    /// Manually grade one field. Always allowed, also after auto-grading.
    pub async fn grade_answer(
        &self,
        song_id: SongId,
        team_id: TeamId,
        field: AnswerField,
        correct: bool,
    ) -> GameResult<Answer> {
        let answer = {
            let mut answers = self.answers.write().await;
            let answer = answers
                .get_mut(&(song_id, team_id))
                .ok_or(GameError::AnswerNotFound { song_id, team_id })?;
            answer.set_grade(field, Grade::from(correct));

            // The auto-grader must never revisit a hand-graded field
            self.graded_fields
                .write()
                .await
                .insert((song_id, team_id, field));
            answer.clone()
        };

        tracing::info!(
            "Manual grade: song {} team {} {:?} -> {}",
            song_id,
            team_id,
            field,
            correct
        );
        self.broadcast_to_admin(ServerMessage::AnswerGraded {
            song_id,
            team_id,
            field,
            correct,
            automatic: false,
        });
        Ok(answer)
    }

    pub async fn get_answer(&self, song_id: SongId, team_id: TeamId) -> Option<Answer> {
        self.answers.read().await.get(&(song_id, team_id)).cloned()
    }

    /// Answers for one song, oldest first
    pub async fn get_answers_for_song(&self, song_id: SongId) -> Vec<Answer> {
        let mut answers: Vec<Answer> = self
            .answers
            .read()
            .await
            .values()
            .filter(|a| a.song_id == song_id)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        answers
    }

    pub async fn get_all_answers(&self) -> Vec<Answer> {
        let mut answers: Vec<Answer> = self.answers.read().await.values().cloned().collect();
        answers.sort_by(|a, b| {
            (a.song_id, &a.submitted_at).cmp(&(b.song_id, &b.submitted_at))
        });
        answers
    }
}
