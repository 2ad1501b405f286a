//! WebSocket message dispatch
//!
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::{admin, player};

/// Return early with UNAUTHORIZED unless the connection is an Admin
macro_rules! check_admin {
    ($role:expr, $action:expr) => {
        if *$role != Role::Admin {
            tracing::warn!("{:?} tried to {}", $role, $action);
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only the admin can {}", $action),
            });
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Player messages
        ClientMessage::RegisterTeam { name } => player::handle_register_team(state, name).await,

        ClientMessage::SubmitAnswer {
            team_id,
            title,
            artist,
        } => player::handle_submit_answer(state, team_id, title, artist).await,

        ClientMessage::Typing { team_id, is_typing } => {
            player::handle_typing(state, team_id, is_typing).await
        }

        ClientMessage::React { team_id, emoji } => {
            player::handle_react(state, team_id, emoji).await
        }

        // Admin-only commands
        ClientMessage::AdminPlay => {
            check_admin!(role, "control playback");
            admin::handle_play(state).await
        }

        ClientMessage::AdminPause => {
            check_admin!(role, "control playback");
            admin::handle_pause(state).await
        }

        ClientMessage::AdminRestart => {
            check_admin!(role, "control playback");
            admin::handle_restart(state).await
        }

        ClientMessage::AdminToggleLyrics => {
            check_admin!(role, "toggle lyrics");
            admin::handle_toggle_lyrics(state).await
        }

        ClientMessage::AdminReveal => {
            check_admin!(role, "reveal songs");
            admin::handle_reveal(state).await
        }

        ClientMessage::AdminSelectSong { song_id } => {
            check_admin!(role, "select songs");
            admin::handle_select_song(state, song_id).await
        }

        ClientMessage::AdminNextSong => {
            check_admin!(role, "select songs");
            admin::handle_next_song(state).await
        }

        ClientMessage::AdminPrevSong => {
            check_admin!(role, "select songs");
            admin::handle_prev_song(state).await
        }

        ClientMessage::AdminGradeAnswer {
            song_id,
            team_id,
            field,
            correct,
        } => {
            check_admin!(role, "grade answers");
            admin::handle_grade_answer(state, song_id, team_id, field, correct).await
        }

        ClientMessage::AdminRegradePending { song_id } => {
            check_admin!(role, "grade answers");
            admin::handle_regrade_pending(state, song_id).await
        }

        ClientMessage::AdminAddTeam { name } => {
            check_admin!(role, "manage teams");
            admin::handle_add_team(state, name).await
        }

        ClientMessage::AdminRemoveTeam { team_id } => {
            check_admin!(role, "manage teams");
            admin::handle_remove_team(state, team_id).await
        }

        ClientMessage::AdminRenameTeam { team_id, name } => {
            check_admin!(role, "manage teams");
            admin::handle_rename_team(state, team_id, name).await
        }

        ClientMessage::AdminUpdateScore { team_id, delta } => {
            check_admin!(role, "change scores");
            admin::handle_update_score(state, team_id, delta).await
        }

        ClientMessage::AdminResetScores => {
            check_admin!(role, "change scores");
            admin::handle_reset_scores(state).await
        }

        ClientMessage::AdminResetGame => {
            check_admin!(role, "reset the game");
            admin::handle_reset_game(state).await
        }

        ClientMessage::AdminClearTeams => {
            check_admin!(role, "manage teams");
            admin::handle_clear_teams(state).await
        }

        ClientMessage::AdminSetPointsPerAnswer { points } => {
            check_admin!(role, "change settings");
            admin::handle_set_points_per_answer(state, points).await
        }

        ClientMessage::AdminSetSpeedBonus {
            enabled,
            gold,
            silver,
            bronze,
        } => {
            check_admin!(role, "change settings");
            admin::handle_set_speed_bonus(state, enabled, gold, silver, bronze).await
        }

        ClientMessage::AdminSetGradingThreshold { threshold } => {
            check_admin!(role, "change settings");
            admin::handle_set_grading_threshold(state, threshold).await
        }

        ClientMessage::AdminStartTimer => {
            check_admin!(role, "control the timer");
            admin::handle_start_timer(state).await
        }

        ClientMessage::AdminStopTimer => {
            check_admin!(role, "control the timer");
            admin::handle_stop_timer(state).await
        }

        ClientMessage::AdminSetTimerDuration { seconds } => {
            check_admin!(role, "control the timer");
            admin::handle_set_timer_duration(state, seconds).await
        }

        ClientMessage::AdminSetScreen { screen } => {
            check_admin!(role, "control the display");
            admin::handle_set_screen(state, screen).await
        }

        ClientMessage::AdminToggleQrCode => {
            check_admin!(role, "control the display");
            admin::handle_toggle_qr_code(state).await
        }

        ClientMessage::AdminToggleScores => {
            check_admin!(role, "control the display");
            admin::handle_toggle_scores(state).await
        }

        ClientMessage::AdminSetAccessCodes {
            access_code,
            admin_pin,
        } => {
            check_admin!(role, "change access codes");
            admin::handle_set_access_codes(state, access_code, admin_pin).await
        }

        ClientMessage::AdminRotateAccessCode => {
            check_admin!(role, "change access codes");
            admin::handle_rotate_access_code(state).await
        }

        ClientMessage::AdminSetSongs { songs } => {
            check_admin!(role, "change the song catalog");
            admin::handle_set_songs(state, songs).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    async fn setup() -> Arc<AppState> {
        let state = Arc::new(AppState::new());
        state.create_game().await;
        state
    }

    fn assert_unauthorized(result: Option<ServerMessage>) {
        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "UNAUTHORIZED"),
            other => panic!("Expected UNAUTHORIZED, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_commands_rejected_for_other_roles() {
        let state = setup().await;

        for role in [Role::Player, Role::Display] {
            assert_unauthorized(handle_message(ClientMessage::AdminReveal, &role, &state).await);
            assert_unauthorized(
                handle_message(ClientMessage::AdminResetGame, &role, &state).await,
            );
            assert_unauthorized(
                handle_message(
                    ClientMessage::AdminUpdateScore {
                        team_id: 1,
                        delta: 100,
                    },
                    &role,
                    &state,
                )
                .await,
            );
        }
        assert!(!state.get_game().await.unwrap().is_revealed);
    }

    #[tokio::test]
    async fn test_register_team() {
        let state = setup().await;

        let result = handle_message(
            ClientMessage::RegisterTeam {
                name: "Elves".to_string(),
            },
            &Role::Player,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::TeamRegistered { team }) => {
                assert_eq!(team.name, "Elves");
                assert_eq!(team.score, 0);
            }
            other => panic!("Expected TeamRegistered, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_answer_twice() {
        let state = setup().await;
        let team = state.add_team("Elves").await.unwrap();
        let submit = || ClientMessage::SubmitAnswer {
            team_id: team.id,
            title: "Leef".to_string(),
            artist: "Hazes".to_string(),
        };

        match handle_message(submit(), &Role::Player, &state).await {
            Some(ServerMessage::AnswerAccepted { song_id }) => assert_eq!(song_id, 1),
            other => panic!("Expected AnswerAccepted, got {:?}", other),
        }
        match handle_message(submit(), &Role::Player, &state).await {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "ANSWER_LOCKED"),
            other => panic!("Expected ANSWER_LOCKED, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_reveal_broadcasts_results() {
        let state = setup().await;
        let team = state.add_team("Elves").await.unwrap();
        state
            .submit_answer(team.id, "Zij Gelooft in Mij".into(), "Hazes".into())
            .await
            .unwrap();
        state
            .grade_answer(1, team.id, AnswerField::Title, true)
            .await
            .unwrap();
        let mut rx = state.broadcast.subscribe();

        let result = handle_message(ClientMessage::AdminReveal, &Role::Admin, &state).await;
        assert!(result.is_none());

        match rx.recv().await {
            Ok(ServerMessage::Revealed {
                song,
                awarded,
                answers,
                teams,
            }) => {
                assert_eq!(song.title_original, "Zij Gelooft in Mij");
                assert_eq!(awarded.get(&team.id), Some(&4));
                assert_eq!(answers.len(), 1);
                assert_eq!(teams[0].score, 4);
            }
            other => panic!("Expected Revealed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_grade_missing_answer() {
        let state = setup().await;

        let result = handle_message(
            ClientMessage::AdminGradeAnswer {
                song_id: 1,
                team_id: 7,
                field: AnswerField::Title,
                correct: true,
            },
            &Role::Admin,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "ANSWER_NOT_FOUND"),
            other => panic!("Expected ANSWER_NOT_FOUND, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_select_song_pushes_game_state() {
        let state = setup().await;
        let mut rx = state.broadcast.subscribe();

        let result = handle_message(
            ClientMessage::AdminSelectSong { song_id: 2 },
            &Role::Admin,
            &state,
        )
        .await;
        assert!(result.is_none());

        match rx.recv().await {
            Ok(ServerMessage::GameState { game, current_song }) => {
                assert_eq!(game.current_song_id, 2);
                assert_eq!(current_song.unwrap().id, 2);
            }
            other => panic!("Expected GameState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_set_access_codes() {
        let state = setup().await;
        let mut admin_rx = state.admin_broadcast.subscribe();

        let result = handle_message(
            ClientMessage::AdminSetAccessCodes {
                access_code: "".to_string(),
                admin_pin: "1".to_string(),
            },
            &Role::Admin,
            &state,
        )
        .await;
        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "INVALID_ACCESS_CODE"),
            other => panic!("Expected INVALID_ACCESS_CODE, got {:?}", other),
        }

        handle_message(ClientMessage::AdminRotateAccessCode, &Role::Admin, &state).await;
        match admin_rx.try_recv() {
            Ok(ServerMessage::AccessCodes { codes }) => {
                assert_eq!(codes, state.get_access_codes().await);
            }
            other => panic!("Expected AccessCodes, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_timer_without_duration() {
        let state = setup().await;

        match handle_message(ClientMessage::AdminStartTimer, &Role::Admin, &state).await {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "TIMER_DISABLED"),
            other => panic!("Expected TIMER_DISABLED, got {:?}", other),
        }
    }
}
