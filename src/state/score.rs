//! Points, speed bonus and the reveal

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

fn submitted_at(answer: &Answer) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&answer.submitted_at)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Points per team for one song's answers.
///
/// Each Correct field is worth `points_per_answer`. With the speed bonus on,
/// the three earliest answers with at least one Correct field get the
/// gold/silver/bronze bonus on top. Answers of unknown teams are ignored and
/// teams that earned nothing are left out.
pub fn compute_awards(
    answers: &[Answer],
    teams: &[Team],
    config: &GameConfig,
) -> BTreeMap<TeamId, u32> {
    let mut scoring: Vec<&Answer> = answers
        .iter()
        .filter(|a| teams.iter().any(|t| t.id == a.team_id))
        .filter(|a| a.correct_fields() > 0)
        .collect();

    let mut awards: BTreeMap<TeamId, u32> = BTreeMap::new();
    for answer in &scoring {
        let points = answer
            .correct_fields()
            .saturating_mul(config.points_per_answer);
        let total = awards.entry(answer.team_id).or_insert(0);
        *total = total.saturating_add(points);
    }

    if config.speed_bonus_enabled {
        // Unparseable timestamps rank last
        scoring.sort_by_key(|a| (submitted_at(a).is_none(), submitted_at(a), a.team_id));
        for (answer, bonus) in scoring.iter().zip(config.speed_bonuses()) {
            if bonus > 0 {
                let total = awards.entry(answer.team_id).or_insert(0);
                *total = total.saturating_add(bonus);
            }
        }
    }

    awards
}

impl AppState {
    /// Reveal the current song and award points.
    ///
    /// A second reveal of the same song returns the awards of the first one
    /// without changing any score.
    pub async fn reveal(&self) -> GameResult<(Song, BTreeMap<TeamId, u32>)> {
        let mut game = self.game.write().await;
        let g = game.as_mut().ok_or(GameError::NoActiveGame)?;

        let song = self
            .songs
            .read()
            .await
            .iter()
            .find(|s| s.id == g.current_song_id)
            .cloned()
            .ok_or(GameError::SongNotFound(g.current_song_id))?;

        if g.is_revealed {
            tracing::debug!("Song {} already revealed", song.id);
            return Ok((song, g.last_awarded_points.clone().unwrap_or_default()));
        }

        let mut teams = self.teams.write().await;
        let answers: Vec<Answer> = self
            .answers
            .read()
            .await
            .values()
            .filter(|a| a.song_id == song.id)
            .cloned()
            .collect();

        let awards = compute_awards(&answers, &teams, &g.config);
        for team in teams.iter_mut() {
            if let Some(points) = awards.get(&team.id) {
                team.score = team.score.saturating_add(*points);
            }
        }

        g.is_revealed = true;
        g.is_playing = true;
        g.timer_active = false;
        g.timer_end = None;
        g.last_awarded_points = if awards.is_empty() {
            None
        } else {
            Some(awards.clone())
        };
        g.version += 1;

        tracing::info!(
            "Revealed song {} ('{}' by '{}'), {} team(s) scored",
            song.id,
            song.title_original,
            song.artist_original,
            awards.len()
        );
        Ok((song, awards))
    }

    /// Teams by score, highest first; ties by name
    pub async fn leaderboard(&self) -> Vec<Team> {
        let mut teams = self.get_teams().await;
        teams.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        teams
    }
}
