use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    // Player messages
    /// Join an existing team or create it (case-insensitive name match)
    RegisterTeam {
        name: String,
    },
    SubmitAnswer {
        team_id: TeamId,
        title: String,
        artist: String,
    },
    /// Typing indicator shown on the Display
    Typing {
        team_id: TeamId,
        is_typing: bool,
    },
    /// Emoji reaction flying across the Display
    React {
        team_id: TeamId,
        emoji: String,
    },

    // Admin-only messages
    AdminPlay,
    AdminPause,
    AdminRestart,
    AdminToggleLyrics,
    AdminReveal,
    AdminSelectSong {
        song_id: SongId,
    },
    AdminNextSong,
    AdminPrevSong,
    /// Manual grading, always wins over the auto-grader
    AdminGradeAnswer {
        song_id: SongId,
        team_id: TeamId,
        field: AnswerField,
        correct: bool,
    },
    /// Re-run auto-grading for pending answers of a song
    AdminRegradePending {
        song_id: SongId,
    },
    AdminAddTeam {
        name: String,
    },
    AdminRemoveTeam {
        team_id: TeamId,
    },
    AdminRenameTeam {
        team_id: TeamId,
        name: String,
    },
    AdminUpdateScore {
        team_id: TeamId,
        delta: i64,
    },
    AdminResetScores,
    AdminResetGame,
    AdminClearTeams,
    AdminSetPointsPerAnswer {
        points: u32,
    },
    AdminSetSpeedBonus {
        enabled: bool,
        gold: u32,
        silver: u32,
        bronze: u32,
    },
    AdminSetGradingThreshold {
        threshold: usize,
    },
    AdminStartTimer,
    AdminStopTimer,
    AdminSetTimerDuration {
        seconds: u32,
    },
    AdminSetScreen {
        screen: DisplayScreen,
    },
    AdminToggleQrCode,
    AdminToggleScores,
    AdminSetAccessCodes {
        access_code: String,
        admin_pin: String,
    },
    /// Replace the access code with a random one
    AdminRotateAccessCode,
    AdminSetSongs {
        songs: Vec<Song>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        game: GameState,
        teams: Vec<Team>,
        current_song: Option<SongInfo>,
        server_now: String,
    },
    GameState {
        game: GameState,
        current_song: Option<SongInfo>,
    },
    Teams {
        teams: Vec<Team>,
    },
    TeamRegistered {
        team: Team,
    },
    /// Sent to the submitting team
    AnswerAccepted {
        song_id: SongId,
    },
    /// Admin-only: all answers for a song, including grades
    Answers {
        song_id: SongId,
        answers: Vec<Answer>,
    },
    /// Broadcast whenever a field grade changes
    AnswerGraded {
        song_id: SongId,
        team_id: TeamId,
        field: AnswerField,
        correct: bool,
        automatic: bool,
    },
    /// Full song, points of this reveal, graded answers and the leaderboard
    Revealed {
        song: Song,
        awarded: BTreeMap<TeamId, u32>,
        answers: Vec<Answer>,
        teams: Vec<Team>,
    },
    /// Admin-only: full catalog including the answers
    Songs {
        songs: Vec<Song>,
    },
    Typing {
        team_id: TeamId,
        is_typing: bool,
    },
    Reaction {
        team_id: TeamId,
        emoji: String,
    },
    TimerExpired {
        song_id: SongId,
    },
    /// Admin-only
    AccessCodes {
        codes: AccessCodes,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(err: &crate::error::GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Song as shown before the reveal (no canonical answer)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongInfo {
    pub id: SongId,
    pub genre: Option<String>,
    pub cover_image: Option<String>,
    pub audio_url: Option<String>,
    pub lyrics_snippet: Option<String>,
    /// Present only once the song has been revealed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_original: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_original: Option<String>,
}

impl SongInfo {
    pub fn new(song: &Song, is_revealed: bool) -> Self {
        Self {
            id: song.id,
            genre: song.genre.clone(),
            cover_image: song.cover_image.clone(),
            audio_url: song.active_audio_url(is_revealed).map(str::to_string),
            lyrics_snippet: song.lyrics_snippet.clone(),
            title_original: is_revealed.then(|| song.title_original.clone()),
            artist_original: is_revealed.then(|| song.artist_original.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_tagging() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"t":"admin_grade_answer","song_id":1,"team_id":2,"field":"artist","correct":false}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::AdminGradeAnswer {
                song_id,
                team_id,
                field,
                correct,
            } => {
                assert_eq!(song_id, 1);
                assert_eq!(team_id, 2);
                assert_eq!(field, AnswerField::Artist);
                assert!(!correct);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_song_info_hides_answer_until_reveal() {
        let song = default_songs().remove(0);

        let hidden = serde_json::to_value(SongInfo::new(&song, false)).unwrap();
        assert!(hidden.get("title_original").is_none());
        assert!(hidden.get("artist_original").is_none());

        let shown = SongInfo::new(&song, true);
        assert_eq!(shown.title_original.as_deref(), Some("Zij Gelooft in Mij"));
    }
}
