//! Song catalog

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;

fn validate_catalog(songs: &[Song]) -> GameResult<()> {
    if songs.is_empty() {
        return Err(GameError::InvalidSongCatalog(
            "catalog must contain at least one song".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for song in songs {
        if !seen.insert(song.id) {
            return Err(GameError::InvalidSongCatalog(format!(
                "duplicate song id {}",
                song.id
            )));
        }
    }
    Ok(())
}

impl AppState {
    pub async fn get_songs(&self) -> Vec<Song> {
        self.songs.read().await.clone()
    }

    pub async fn get_song(&self, song_id: SongId) -> Option<Song> {
        self.songs
            .read()
            .await
            .iter()
            .find(|s| s.id == song_id)
            .cloned()
    }

    /// The game's current song, or the first one if it no longer exists
    pub async fn current_song(&self) -> Option<Song> {
        let current_id = self.game.read().await.as_ref()?.current_song_id;
        let songs = self.songs.read().await;
        songs
            .iter()
            .find(|s| s.id == current_id)
            .or_else(|| songs.first())
            .cloned()
    }

    /// Replace the catalog
    ///
    /// If the current song disappears, the game moves to the first new song.
    pub async fn set_songs(&self, songs: Vec<Song>) -> GameResult<()> {
        validate_catalog(&songs)?;

        let mut game = self.game.write().await;
        let first_id = songs[0].id;
        let ids: HashSet<SongId> = songs.iter().map(|s| s.id).collect();
        *self.songs.write().await = songs;

        if let Some(g) = game.as_mut() {
            if !ids.contains(&g.current_song_id) {
                g.current_song_id = first_id;
                g.is_revealed = false;
                g.is_playing = false;
                g.last_awarded_points = None;
                g.version += 1;
            }
        }

        tracing::info!("Song catalog replaced ({} songs)", ids.len());
        Ok(())
    }

    /// Load the catalog from a JSON array of songs
    pub async fn load_songs_from_file(&self, path: impl AsRef<Path>) -> GameResult<usize> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            GameError::InvalidSongCatalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let songs: Vec<Song> = serde_json::from_str(&content).map_err(|e| {
            GameError::InvalidSongCatalog(format!("cannot parse {}: {}", path.display(), e))
        })?;

        let count = songs.len();
        self.set_songs(songs).await?;
        Ok(count)
    }
}
