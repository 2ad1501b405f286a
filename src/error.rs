use crate::types::{SongId, TeamId};

/// Errors returned by state operations
///
/// Each variant maps to a stable wire code sent in `ServerMessage::Error`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("No active game")]
    NoActiveGame,

    #[error("Team {0} not found")]
    TeamNotFound(TeamId),

    #[error("Team '{0}' already exists")]
    TeamExists(String),

    #[error("Team name cannot be empty")]
    InvalidTeamName,

    #[error("Song {0} not found")]
    SongNotFound(SongId),

    #[error("Invalid song catalog: {0}")]
    InvalidSongCatalog(String),

    #[error("Both title and artist are required")]
    EmptyAnswer,

    #[error("Team {team_id} already answered song {song_id}")]
    AnswerLocked { song_id: SongId, team_id: TeamId },

    #[error("No answer from team {team_id} for song {song_id}")]
    AnswerNotFound { song_id: SongId, team_id: TeamId },

    #[error("Song {0} has already been revealed")]
    AlreadyRevealed(SongId),

    #[error("Timer duration is not set")]
    TimerDisabled,

    #[error("Access codes cannot be empty")]
    InvalidAccessCode,

    #[error("Reaction must be a single short emoji")]
    InvalidReaction,

    #[error("Import failed: {0}")]
    Import(String),
}

impl GameError {
    /// Wire error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NoActiveGame => "NO_ACTIVE_GAME",
            GameError::TeamNotFound(_) => "TEAM_NOT_FOUND",
            GameError::TeamExists(_) => "TEAM_EXISTS",
            GameError::InvalidTeamName => "INVALID_TEAM_NAME",
            GameError::SongNotFound(_) => "SONG_NOT_FOUND",
            GameError::InvalidSongCatalog(_) => "INVALID_SONG_CATALOG",
            GameError::EmptyAnswer => "EMPTY_ANSWER",
            GameError::AnswerLocked { .. } => "ANSWER_LOCKED",
            GameError::AnswerNotFound { .. } => "ANSWER_NOT_FOUND",
            GameError::AlreadyRevealed(_) => "ALREADY_REVEALED",
            GameError::TimerDisabled => "TIMER_DISABLED",
            GameError::InvalidAccessCode => "INVALID_ACCESS_CODE",
            GameError::InvalidReaction => "INVALID_REACTION",
            GameError::Import(_) => "IMPORT_FAILED",
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_messages() {
        let err = GameError::AnswerLocked {
            song_id: 2,
            team_id: 5,
        };
        assert_eq!(err.code(), "ANSWER_LOCKED");
        assert_eq!(err.to_string(), "Team 5 already answered song 2");
        assert_eq!(GameError::TeamNotFound(3).code(), "TEAM_NOT_FOUND");
        assert_eq!(
            GameError::Import("bad".to_string()).to_string(),
            "Import failed: bad"
        );
    }
}
