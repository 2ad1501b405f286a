use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TeamId = u32;
pub type SongId = u32;
pub type AnswerId = String;

/// Which part of an answer is being graded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AnswerField {
    Title,
    Artist,
}

impl AnswerField {
    pub const ALL: [AnswerField; 2] = [AnswerField::Title, AnswerField::Artist];
}

/// Tri-state grade of one answer field.
///
/// Serialized as `null` (pending), `true` or `false`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Grade {
    #[default]
    Pending,
    Correct,
    Incorrect,
}

impl Grade {
    pub fn is_pending(&self) -> bool {
        *self == Grade::Pending
    }

    pub fn is_correct(&self) -> bool {
        *self == Grade::Correct
    }
}

impl From<Option<bool>> for Grade {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Grade::Pending,
            Some(true) => Grade::Correct,
            Some(false) => Grade::Incorrect,
        }
    }
}

impl From<Grade> for Option<bool> {
    fn from(grade: Grade) -> Self {
        match grade {
            Grade::Pending => None,
            Grade::Correct => Some(true),
            Grade::Incorrect => Some(false),
        }
    }
}

impl From<bool> for Grade {
    fn from(correct: bool) -> Self {
        if correct {
            Grade::Correct
        } else {
            Grade::Incorrect
        }
    }
}

/// A team's guess for one song
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub song_id: SongId,
    pub team_id: TeamId,
    pub title: String,
    pub artist: String,
    pub submitted_at: String, // RFC3339
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub title_correct: Grade,
    #[serde(default)]
    pub artist_correct: Grade,
}

impl Answer {
    pub fn text(&self, field: AnswerField) -> &str {
        match field {
            AnswerField::Title => &self.title,
            AnswerField::Artist => &self.artist,
        }
    }

    pub fn grade(&self, field: AnswerField) -> Grade {
        match field {
            AnswerField::Title => self.title_correct,
            AnswerField::Artist => self.artist_correct,
        }
    }

    pub fn set_grade(&mut self, field: AnswerField, grade: Grade) {
        match field {
            AnswerField::Title => self.title_correct = grade,
            AnswerField::Artist => self.artist_correct = grade,
        }
    }

    pub fn correct_fields(&self) -> u32 {
        AnswerField::ALL
            .iter()
            .filter(|f| self.grade(**f).is_correct())
            .count() as u32
    }

    pub fn has_pending(&self) -> bool {
        AnswerField::ALL.iter().any(|f| self.grade(*f).is_pending())
    }
}

/// Quiz content for one round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub title_original: String,
    pub artist_original: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Cover version played before the reveal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Played after the reveal (falls back to `audio_url`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url_revealed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics_snippet: Option<String>,
}

impl Song {
    pub fn canonical(&self, field: AnswerField) -> &str {
        match field {
            AnswerField::Title => &self.title_original,
            AnswerField::Artist => &self.artist_original,
        }
    }

    /// Audio to play for the current reveal state
    pub fn active_audio_url(&self, is_revealed: bool) -> Option<&str> {
        if is_revealed {
            if let Some(url) = self.audio_url_revealed.as_deref() {
                return Some(url);
            }
        }
        self.audio_url.as_deref()
    }
}

/// Catalog used when no SONGS_PATH is configured
pub fn default_songs() -> Vec<Song> {
    let song = |id, title: &str, artist: &str, genre: &str, lyrics: &str| Song {
        id,
        title_original: title.to_string(),
        artist_original: artist.to_string(),
        genre: Some(genre.to_string()),
        cover_image: None,
        audio_url: None,
        audio_url_revealed: None,
        lyrics_snippet: Some(lyrics.to_string()),
    };

    vec![
        song(
            1,
            "Zij Gelooft in Mij",
            "André Hazes",
            "80s Synthpop",
            "She believes in me, she sees the sun rise in my eyes...",
        ),
        song(
            2,
            "Het Is Een Nacht",
            "Guus Meeuwis",
            "Country Ballad",
            "It's a night that you normally only see in movies...",
        ),
        song(
            3,
            "Leef",
            "André Hazes Jr.",
            "Disco Funk",
            "Live, because soon it might be too late, live, live...",
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub score: u32,
}

/// What the Display shows besides the current song
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayScreen {
    #[default]
    Song,
    InterimStandings,
    LeaderOpening,
    FinalPodium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    #[serde(default = "default_points_per_answer")]
    pub points_per_answer: u32,
    #[serde(default = "default_true")]
    pub speed_bonus_enabled: bool,
    #[serde(default = "default_gold")]
    pub speed_bonus_gold: u32,
    #[serde(default = "default_silver")]
    pub speed_bonus_silver: u32,
    #[serde(default = "default_bronze")]
    pub speed_bonus_bronze: u32,
    #[serde(default = "default_threshold")]
    pub grading_threshold: usize,
}

fn default_points_per_answer() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_gold() -> u32 {
    3
}

fn default_silver() -> u32 {
    2
}

fn default_bronze() -> u32 {
    1
}

fn default_threshold() -> usize {
    crate::grader::DEFAULT_THRESHOLD
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            points_per_answer: default_points_per_answer(),
            speed_bonus_enabled: true,
            speed_bonus_gold: default_gold(),
            speed_bonus_silver: default_silver(),
            speed_bonus_bronze: default_bronze(),
            grading_threshold: default_threshold(),
        }
    }
}

impl GameConfig {
    /// Bonus for the 1st, 2nd and 3rd fastest correct answers
    pub fn speed_bonuses(&self) -> [u32; 3] {
        [
            self.speed_bonus_gold,
            self.speed_bonus_silver,
            self.speed_bonus_bronze,
        ]
    }
}

/// Shared game state pushed to every role.
///
/// Every field has a default so partial snapshots deserialize cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub current_song_id: SongId,
    #[serde(default)]
    pub is_playing: bool,
    /// Incremented on every restart so the Display rewinds the track
    #[serde(default)]
    pub restart_seq: u64,
    #[serde(default)]
    pub show_lyrics: bool,
    #[serde(default)]
    pub is_revealed: bool,
    /// Points handed out by the last reveal (for the Display animation)
    #[serde(default)]
    pub last_awarded_points: Option<BTreeMap<TeamId, u32>>,
    /// 0 = no timer
    #[serde(default)]
    pub timer_duration_secs: u32,
    #[serde(default)]
    pub timer_end: Option<String>, // RFC3339
    #[serde(default)]
    pub timer_active: bool,
    #[serde(default)]
    pub show_qr_code: bool,
    #[serde(default)]
    pub show_scores_on_display: bool,
    #[serde(default)]
    pub screen: DisplayScreen,
    #[serde(default)]
    pub config: GameConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Display,
    Player,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "display" => Some(Role::Display),
            "player" => Some(Role::Player),
            _ => None,
        }
    }
}

pub const DEFAULT_ACCESS_CODE: &str = "5555";
pub const DEFAULT_ADMIN_PIN: &str = "1230";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessCodes {
    pub access_code: String,
    pub admin_pin: String,
}

impl Default for AccessCodes {
    fn default() -> Self {
        Self {
            access_code: DEFAULT_ACCESS_CODE.to_string(),
            admin_pin: DEFAULT_ADMIN_PIN.to_string(),
        }
    }
}
