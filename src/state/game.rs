//! Game lifecycle, playback, display settings and the answer timer

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use chrono::{DateTime, Duration, Utc};

impl AppState {
    /// Initialize a new game on the first song of the catalog
    pub async fn create_game(&self) -> GameState {
        let first_song_id = self.songs.read().await.first().map(|s| s.id).unwrap_or(1);
        let game = GameState {
            version: 1,
            current_song_id: first_song_id,
            config: self.default_config.clone(),
            ..GameState::default()
        };

        *self.game.write().await = Some(game.clone());
        game
    }

    /// Get current game
    pub async fn get_game(&self) -> Option<GameState> {
        self.game.read().await.clone()
    }

    /// Apply a mutation to the game and bump its version
    pub(crate) async fn update_game<F>(&self, mutate: F) -> GameResult<GameState>
    where
        F: FnOnce(&mut GameState),
    {
        let mut game = self.game.write().await;
        let g = game.as_mut().ok_or(GameError::NoActiveGame)?;
        mutate(g);
        g.version += 1;
        Ok(g.clone())
    }

    /// Reset scores, flags and answers; teams and settings are kept
    pub async fn reset_game(&self) -> GameResult<GameState> {
        let mut game = self.game.write().await;
        let g = game.as_mut().ok_or(GameError::NoActiveGame)?;

        let first_song_id = self
            .songs
            .read()
            .await
            .first()
            .map(|s| s.id)
            .unwrap_or(g.current_song_id);

        for team in self.teams.write().await.iter_mut() {
            team.score = 0;
        }
        self.answers.write().await.clear();
        self.graded_fields.write().await.clear();

        g.current_song_id = first_song_id;
        g.is_revealed = false;
        g.show_lyrics = false;
        g.is_playing = false;
        g.last_awarded_points = None;
        g.timer_end = None;
        g.timer_active = false;
        g.screen = DisplayScreen::Song;
        g.version += 1;

        tracing::info!("Game reset");
        Ok(g.clone())
    }

    pub async fn play(&self) -> GameResult<GameState> {
        self.update_game(|g| g.is_playing = true).await
    }

    pub async fn pause(&self) -> GameResult<GameState> {
        self.update_game(|g| g.is_playing = false).await
    }

    /// Start the current track from the beginning
    pub async fn restart(&self) -> GameResult<GameState> {
        self.update_game(|g| {
            g.is_playing = true;
            g.restart_seq += 1;
        })
        .await
    }

    pub async fn toggle_lyrics(&self) -> GameResult<GameState> {
        self.update_game(|g| g.show_lyrics = !g.show_lyrics).await
    }

    /// Switch to another song, hiding the answer again
    pub async fn select_song(&self, song_id: SongId) -> GameResult<GameState> {
        if self.get_song(song_id).await.is_none() {
            return Err(GameError::SongNotFound(song_id));
        }

        tracing::info!("Selecting song {}", song_id);
        self.update_game(|g| {
            g.current_song_id = song_id;
            g.is_revealed = false;
            g.show_lyrics = false;
            g.is_playing = false;
            g.last_awarded_points = None;
            g.timer_end = None;
            g.timer_active = false;
        })
        .await
    }

    /// Advance to the next song, wrapping around
    pub async fn next_song(&self) -> GameResult<GameState> {
        let current = self.get_game().await.ok_or(GameError::NoActiveGame)?;
        let next_id = {
            let songs = self.songs.read().await;
            if songs.is_empty() {
                return Err(GameError::SongNotFound(current.current_song_id));
            }
            // An unknown current song counts as "before the first"
            let next_index = songs
                .iter()
                .position(|s| s.id == current.current_song_id)
                .map(|i| (i + 1) % songs.len())
                .unwrap_or(0);
            songs[next_index].id
        };
        self.select_song(next_id).await
    }

    /// Go back to the previous song, wrapping around
    pub async fn prev_song(&self) -> GameResult<GameState> {
        let current = self.get_game().await.ok_or(GameError::NoActiveGame)?;
        let prev_id = {
            let songs = self.songs.read().await;
            if songs.is_empty() {
                return Err(GameError::SongNotFound(current.current_song_id));
            }
            let prev_index = match songs.iter().position(|s| s.id == current.current_song_id) {
                Some(i) if i > 0 => i - 1,
                _ => songs.len() - 1,
            };
            songs[prev_index].id
        };
        self.select_song(prev_id).await
    }

    pub async fn set_points_per_answer(&self, points: u32) -> GameResult<GameState> {
        self.update_game(|g| g.config.points_per_answer = points.max(1))
            .await
    }

    pub async fn set_speed_bonus(
        &self,
        enabled: bool,
        gold: u32,
        silver: u32,
        bronze: u32,
    ) -> GameResult<GameState> {
        self.update_game(|g| {
            g.config.speed_bonus_enabled = enabled;
            g.config.speed_bonus_gold = gold;
            g.config.speed_bonus_silver = silver;
            g.config.speed_bonus_bronze = bronze;
        })
        .await
    }

    pub async fn set_grading_threshold(&self, threshold: usize) -> GameResult<GameState> {
        tracing::info!("Grading threshold set to {}", threshold);
        self.update_game(|g| g.config.grading_threshold = threshold)
            .await
    }

    pub async fn set_display_screen(&self, screen: DisplayScreen) -> GameResult<GameState> {
        self.update_game(|g| g.screen = screen).await
    }

    pub async fn toggle_qr_code(&self) -> GameResult<GameState> {
        self.update_game(|g| g.show_qr_code = !g.show_qr_code).await
    }

    pub async fn toggle_scores_on_display(&self) -> GameResult<GameState> {
        self.update_game(|g| g.show_scores_on_display = !g.show_scores_on_display)
            .await
    }

    /// 0 disables the timer
    pub async fn set_timer_duration(&self, seconds: u32) -> GameResult<GameState> {
        self.update_game(|g| g.timer_duration_secs = seconds).await
    }

    pub async fn start_timer(&self) -> GameResult<GameState> {
        let game = self.get_game().await.ok_or(GameError::NoActiveGame)?;
        if game.timer_duration_secs == 0 {
            return Err(GameError::TimerDisabled);
        }

        let end = Utc::now() + Duration::seconds(i64::from(game.timer_duration_secs));
        self.update_game(|g| {
            g.timer_end = Some(end.to_rfc3339());
            g.timer_active = true;
        })
        .await
    }

    pub async fn stop_timer(&self) -> GameResult<GameState> {
        self.update_game(|g| {
            g.timer_end = None;
            g.timer_active = false;
        })
        .await
    }

    /// Deactivate the timer if its end has passed.
    ///
    /// Returns the song the timer was running for, once per expiry.
    pub async fn expire_timer_if_due(&self, now: DateTime<Utc>) -> Option<SongId> {
        let mut game = self.game.write().await;
        let g = game.as_mut()?;
        if !g.timer_active {
            return None;
        }

        let end = g
            .timer_end
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        match end {
            Some(end) if end > now => None,
            _ => {
                g.timer_active = false;
                g.version += 1;
                Some(g.current_song_id)
            }
        }
    }
}
