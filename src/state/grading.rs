//! Auto-grading of submitted answers
//!
//! Answers are observed through `answer_events`, which may deliver the same
//! answer more than once (resubscription, regrade requests, imports). Only
//! pending fields are considered, a field is auto-approved at most once, and
//! the grader never marks anything incorrect: non-matching fields stay
//! pending until the showmaster grades them.

use super::AppState;
use crate::grader::fuzzy_match;
use crate::protocol::ServerMessage;
use crate::types::*;

/// "This answer may have pending fields"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnswerObserved {
    pub song_id: SongId,
    pub team_id: TeamId,
}

impl AppState {
    pub fn publish_answer_observed(&self, event: AnswerObserved) {
        // No grader running (tests, shutdown) is fine
        let _ = self.answer_events.send(event);
    }

    /// Auto-grade the pending fields of one answer.
    ///
    /// Returns the fields that were approved by this call.
    pub async fn auto_grade(&self, song_id: SongId, team_id: TeamId) -> Vec<AnswerField> {
        let Some(song) = self.get_song(song_id).await else {
            tracing::warn!("Auto-grade skipped: song {} not in catalog", song_id);
            return Vec::new();
        };
        let threshold = match self.get_game().await {
            Some(game) => game.config.grading_threshold,
            None => self.default_config.grading_threshold,
        };

        let mut approved = Vec::new();
        {
            let mut answers = self.answers.write().await;
            let Some(answer) = answers.get_mut(&(song_id, team_id)) else {
                return approved;
            };
            let mut graded = self.graded_fields.write().await;

            for field in AnswerField::ALL {
                let key = (song_id, team_id, field);
                if graded.contains(&key) || !answer.grade(field).is_pending() {
                    continue;
                }

                let result = fuzzy_match(answer.text(field), song.canonical(field), threshold);
                tracing::debug!(
                    "Auto-grade song {} team {} {:?}: distance {} (threshold {})",
                    song_id,
                    team_id,
                    field,
                    result.normalized_distance,
                    threshold
                );

                if result.auto_approved {
                    answer.set_grade(field, Grade::Correct);
                    graded.insert(key);
                    approved.push(field);
                }
            }
        }

        for field in &approved {
            tracing::info!(
                "Auto-approved song {} team {} {:?}",
                song_id,
                team_id,
                field
            );
            self.broadcast_to_admin(ServerMessage::AnswerGraded {
                song_id,
                team_id,
                field: *field,
                correct: true,
                automatic: true,
            });
        }
        approved
    }

    /// Auto-grade every answer of a song that still has pending fields.
    ///
    /// Returns the number of fields approved.
    pub async fn regrade_pending(&self, song_id: SongId) -> usize {
        let pending: Vec<TeamId> = self
            .get_answers_for_song(song_id)
            .await
            .into_iter()
            .filter(Answer::has_pending)
            .map(|a| a.team_id)
            .collect();

        let mut approved = 0;
        for team_id in pending {
            approved += self.auto_grade(song_id, team_id).await.len();
        }
        approved
    }

    /// Re-emit observations for all answers with pending fields
    pub async fn republish_pending(&self) -> usize {
        let pending: Vec<AnswerObserved> = self
            .answers
            .read()
            .await
            .values()
            .filter(|a| a.has_pending())
            .map(|a| AnswerObserved {
                song_id: a.song_id,
                team_id: a.team_id,
            })
            .collect();

        for event in &pending {
            self.publish_answer_observed(*event);
        }
        pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (AppState, Team) {
        let state = AppState::new();
        state.create_game().await;
        let team = state.add_team("Elves").await.unwrap();
        (state, team)
    }

    #[tokio::test]
    async fn test_auto_grade_approves_close_answers() {
        let (state, team) = setup().await;
        // Song 1: "Zij Gelooft in Mij" by "André Hazes"
        state
            .submit_answer(team.id, "zij geloofd in mij".into(), "Andre Hazes".into())
            .await
            .unwrap();

        let approved = state.auto_grade(1, team.id).await;
        assert_eq!(approved, vec![AnswerField::Title, AnswerField::Artist]);

        let answer = state.get_answer(1, team.id).await.unwrap();
        assert_eq!(answer.title_correct, Grade::Correct);
        assert_eq!(answer.artist_correct, Grade::Correct);
    }

    #[tokio::test]
    async fn test_auto_grade_never_marks_incorrect() {
        let (state, team) = setup().await;
        state
            .submit_answer(team.id, "Let It Go".into(), "André Hazes".into())
            .await
            .unwrap();

        let approved = state.auto_grade(1, team.id).await;
        assert_eq!(approved, vec![AnswerField::Artist]);

        let answer = state.get_answer(1, team.id).await.unwrap();
        assert_eq!(answer.title_correct, Grade::Pending);
        assert_eq!(answer.artist_correct, Grade::Correct);
    }

    #[tokio::test]
    async fn test_redelivered_observation_writes_once() {
        let (state, team) = setup().await;
        state
            .submit_answer(team.id, "Zij Gelooft in Mij".into(), "Hazes".into())
            .await
            .unwrap();
        let mut admin_rx = state.admin_broadcast.subscribe();

        let first = state.auto_grade(1, team.id).await;
        assert_eq!(first, vec![AnswerField::Title]);
        for _ in 0..5 {
            assert!(state.auto_grade(1, team.id).await.is_empty());
        }

        let answer = state.get_answer(1, team.id).await.unwrap();
        assert_eq!(answer.title_correct, Grade::Correct);

        // Exactly one AnswerGraded went out
        assert!(matches!(
            admin_rx.try_recv(),
            Ok(ServerMessage::AnswerGraded {
                field: AnswerField::Title,
                automatic: true,
                ..
            })
        ));
        assert!(admin_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_manual_grade_wins_over_auto_grade() {
        let (state, team) = setup().await;
        state
            .submit_answer(team.id, "Zij Gelooft in Mij".into(), "André Hazes".into())
            .await
            .unwrap();

        // Showmaster disagrees before the grader gets to it
        state
            .grade_answer(1, team.id, AnswerField::Title, false)
            .await
            .unwrap();

        let approved = state.auto_grade(1, team.id).await;
        assert_eq!(approved, vec![AnswerField::Artist]);

        let answer = state.get_answer(1, team.id).await.unwrap();
        assert_eq!(answer.title_correct, Grade::Incorrect);
    }

    #[tokio::test]
    async fn test_threshold_change_and_regrade() {
        let (state, team) = setup().await;
        // "leeeeef" is 3 edits from "leef"
        state.select_song(3).await.unwrap();
        state.set_grading_threshold(2).await.unwrap();
        state
            .submit_answer(team.id, "Leeeeef".into(), "Nobody".into())
            .await
            .unwrap();

        assert!(state.auto_grade(3, team.id).await.is_empty());

        state.set_grading_threshold(3).await.unwrap();
        assert_eq!(state.regrade_pending(3).await, 1);
        assert_eq!(
            state.get_answer(3, team.id).await.unwrap().title_correct,
            Grade::Correct
        );
    }

    #[tokio::test]
    async fn test_auto_grade_unknown_answer_or_song() {
        let (state, team) = setup().await;
        assert!(state.auto_grade(1, team.id).await.is_empty());
        assert!(state.auto_grade(42, team.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_republish_pending() {
        let (state, team) = setup().await;
        let other = state.add_team("Reindeer").await.unwrap();
        state
            .submit_answer(team.id, "Zij Gelooft in Mij".into(), "André Hazes".into())
            .await
            .unwrap();
        state
            .submit_answer(other.id, "Nope".into(), "Nobody".into())
            .await
            .unwrap();
        state.auto_grade(1, team.id).await;

        let mut rx = state.answer_events.subscribe();
        assert_eq!(state.republish_pending().await, 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            AnswerObserved {
                song_id: 1,
                team_id: other.id
            }
        );
    }
}
