use crate::protocol::ServerMessage;
use crate::state::{AnswerObserved, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Spawn the background task that auto-grades observed answers.
///
/// Observations may arrive more than once; `auto_grade` only ever touches
/// fields that are still pending and not yet in the grading ledger.
pub fn spawn_auto_grader(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let mut rx = state.answer_events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(AnswerObserved { song_id, team_id }) => {
                    let approved = state.auto_grade(song_id, team_id).await;
                    if !approved.is_empty() {
                        state.broadcast_answers_to_admin(song_id).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Dropped events are recovered by sweeping everything pending
                    tracing::warn!("Auto-grader lagged by {} events, sweeping", skipped);
                    state.republish_pending().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Spawn a background task that ends the answer timer once it runs out
pub fn spawn_timer_watcher(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(250)).await;

            let Some(song_id) = state.expire_timer_if_due(chrono::Utc::now()).await else {
                continue;
            };

            tracing::info!("Timer expired for song {}", song_id);
            state.broadcast_to_all(ServerMessage::TimerExpired { song_id });
            state.broadcast_game_state().await;
        }
    })
}
