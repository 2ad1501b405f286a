//! Admin-only command handlers
//!
//! All handlers in this module require the Admin role.
//! Authorization is checked in the main dispatch layer before calling these.
//!
//! State changes are pushed over the broadcast channels, so most handlers
//! only answer directly with an error.

use crate::error::GameResult;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

/// Broadcast the new game state, or report the error to the caller
async fn game_updated(
    state: &Arc<AppState>,
    result: GameResult<GameState>,
) -> Option<ServerMessage> {
    match result {
        Ok(_) => {
            state.broadcast_game_state().await;
            None
        }
        Err(e) => Some(ServerMessage::error(&e)),
    }
}

async fn teams_updated(state: &Arc<AppState>, result: GameResult<Team>) -> Option<ServerMessage> {
    match result {
        Ok(_) => {
            state.broadcast_teams().await;
            None
        }
        Err(e) => Some(ServerMessage::error(&e)),
    }
}

/// Refresh the Admin answer list of the current song
async fn admin_answers_updated(state: &Arc<AppState>) {
    if let Some(game) = state.get_game().await {
        state.broadcast_answers_to_admin(game.current_song_id).await;
    }
}

pub async fn handle_play(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.play().await).await
}

pub async fn handle_pause(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.pause().await).await
}

pub async fn handle_restart(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.restart().await).await
}

pub async fn handle_toggle_lyrics(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.toggle_lyrics().await).await
}

pub async fn handle_reveal(state: &Arc<AppState>) -> Option<ServerMessage> {
    let (song, awarded) = match state.reveal().await {
        Ok(revealed) => revealed,
        Err(e) => return Some(ServerMessage::error(&e)),
    };

    let answers = state.get_answers_for_song(song.id).await;
    let teams = state.leaderboard().await;
    state.broadcast_to_all(ServerMessage::Revealed {
        song,
        awarded,
        answers,
        teams,
    });
    state.broadcast_game_state().await;
    state.broadcast_teams().await;
    None
}

/// Switch songs and show the Admin the answers for the new one
async fn song_changed(
    state: &Arc<AppState>,
    result: GameResult<GameState>,
) -> Option<ServerMessage> {
    let song_id = result.as_ref().ok().map(|g| g.current_song_id);
    let response = game_updated(state, result).await;
    if let Some(song_id) = song_id {
        state.broadcast_answers_to_admin(song_id).await;
    }
    response
}

pub async fn handle_select_song(state: &Arc<AppState>, song_id: SongId) -> Option<ServerMessage> {
    tracing::info!("Admin selecting song {}", song_id);
    song_changed(state, state.select_song(song_id).await).await
}

pub async fn handle_next_song(state: &Arc<AppState>) -> Option<ServerMessage> {
    song_changed(state, state.next_song().await).await
}

pub async fn handle_prev_song(state: &Arc<AppState>) -> Option<ServerMessage> {
    song_changed(state, state.prev_song().await).await
}

pub async fn handle_grade_answer(
    state: &Arc<AppState>,
    song_id: SongId,
    team_id: TeamId,
    field: AnswerField,
    correct: bool,
) -> Option<ServerMessage> {
    match state.grade_answer(song_id, team_id, field, correct).await {
        Ok(_) => {
            state.broadcast_answers_to_admin(song_id).await;
            None
        }
        Err(e) => Some(ServerMessage::error(&e)),
    }
}

pub async fn handle_regrade_pending(
    state: &Arc<AppState>,
    song_id: SongId,
) -> Option<ServerMessage> {
    let approved = state.regrade_pending(song_id).await;
    tracing::info!("Regrade of song {} approved {} field(s)", song_id, approved);
    state.broadcast_answers_to_admin(song_id).await;
    None
}

pub async fn handle_add_team(state: &Arc<AppState>, name: String) -> Option<ServerMessage> {
    teams_updated(state, state.add_team(&name).await).await
}

pub async fn handle_remove_team(state: &Arc<AppState>, team_id: TeamId) -> Option<ServerMessage> {
    let result = state.remove_team(team_id).await;
    if result.is_ok() {
        admin_answers_updated(state).await;
    }
    teams_updated(state, result).await
}

pub async fn handle_rename_team(
    state: &Arc<AppState>,
    team_id: TeamId,
    name: String,
) -> Option<ServerMessage> {
    teams_updated(state, state.rename_team(team_id, &name).await).await
}

pub async fn handle_update_score(
    state: &Arc<AppState>,
    team_id: TeamId,
    delta: i64,
) -> Option<ServerMessage> {
    tracing::info!("Admin adjusting score of team {} by {}", team_id, delta);
    teams_updated(state, state.update_score(team_id, delta).await).await
}

pub async fn handle_reset_scores(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("Admin resetting scores");
    state.reset_scores().await;
    state.broadcast_teams().await;
    None
}

pub async fn handle_reset_game(state: &Arc<AppState>) -> Option<ServerMessage> {
    let game = match state.reset_game().await {
        Ok(game) => game,
        Err(e) => return Some(ServerMessage::error(&e)),
    };
    state.broadcast_game_state().await;
    state.broadcast_teams().await;
    state.broadcast_answers_to_admin(game.current_song_id).await;
    None
}

pub async fn handle_clear_teams(state: &Arc<AppState>) -> Option<ServerMessage> {
    state.clear_teams().await;
    admin_answers_updated(state).await;
    state.broadcast_teams().await;
    None
}

pub async fn handle_set_points_per_answer(
    state: &Arc<AppState>,
    points: u32,
) -> Option<ServerMessage> {
    game_updated(state, state.set_points_per_answer(points).await).await
}

pub async fn handle_set_speed_bonus(
    state: &Arc<AppState>,
    enabled: bool,
    gold: u32,
    silver: u32,
    bronze: u32,
) -> Option<ServerMessage> {
    game_updated(
        state,
        state.set_speed_bonus(enabled, gold, silver, bronze).await,
    )
    .await
}

pub async fn handle_set_grading_threshold(
    state: &Arc<AppState>,
    threshold: usize,
) -> Option<ServerMessage> {
    game_updated(state, state.set_grading_threshold(threshold).await).await
}

pub async fn handle_start_timer(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.start_timer().await).await
}

pub async fn handle_stop_timer(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.stop_timer().await).await
}

pub async fn handle_set_timer_duration(
    state: &Arc<AppState>,
    seconds: u32,
) -> Option<ServerMessage> {
    game_updated(state, state.set_timer_duration(seconds).await).await
}

pub async fn handle_set_screen(
    state: &Arc<AppState>,
    screen: DisplayScreen,
) -> Option<ServerMessage> {
    game_updated(state, state.set_display_screen(screen).await).await
}

pub async fn handle_toggle_qr_code(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.toggle_qr_code().await).await
}

pub async fn handle_toggle_scores(state: &Arc<AppState>) -> Option<ServerMessage> {
    game_updated(state, state.toggle_scores_on_display().await).await
}

pub async fn handle_set_access_codes(
    state: &Arc<AppState>,
    access_code: String,
    admin_pin: String,
) -> Option<ServerMessage> {
    match state.set_access_codes(&access_code, &admin_pin).await {
        Ok(codes) => {
            state.broadcast_to_admin(ServerMessage::AccessCodes { codes });
            None
        }
        Err(e) => Some(ServerMessage::error(&e)),
    }
}

pub async fn handle_rotate_access_code(state: &Arc<AppState>) -> Option<ServerMessage> {
    let codes = state.rotate_access_code().await;
    state.broadcast_to_admin(ServerMessage::AccessCodes { codes });
    None
}

pub async fn handle_set_songs(state: &Arc<AppState>, songs: Vec<Song>) -> Option<ServerMessage> {
    if let Err(e) = state.set_songs(songs).await {
        return Some(ServerMessage::error(&e));
    }
    state.broadcast_to_admin(ServerMessage::Songs {
        songs: state.get_songs().await,
    });
    state.broadcast_game_state().await;
    None
}
