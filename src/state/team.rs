//! Team registration and scores

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;

fn clean_name(name: &str) -> GameResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidTeamName);
    }
    Ok(name.to_string())
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl AppState {
    pub async fn get_teams(&self) -> Vec<Team> {
        self.teams.read().await.clone()
    }

    pub async fn get_team(&self, team_id: TeamId) -> Option<Team> {
        self.teams
            .read()
            .await
            .iter()
            .find(|t| t.id == team_id)
            .cloned()
    }

    /// Add a team; names are unique ignoring case
    pub async fn add_team(&self, name: &str) -> GameResult<Team> {
        let name = clean_name(name)?;
        let mut teams = self.teams.write().await;

        if teams.iter().any(|t| same_name(&t.name, &name)) {
            return Err(GameError::TeamExists(name));
        }

        let id = teams.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let team = Team {
            id,
            name,
            score: 0,
        };
        teams.push(team.clone());

        tracing::info!("Team added: {} ({})", team.name, team.id);
        Ok(team)
    }

    /// Join an existing team by name, creating it if needed
    pub async fn register_team(&self, name: &str) -> GameResult<Team> {
        let cleaned = clean_name(name)?;
        if let Some(existing) = self
            .teams
            .read()
            .await
            .iter()
            .find(|t| same_name(&t.name, &cleaned))
        {
            return Ok(existing.clone());
        }

        match self.add_team(&cleaned).await {
            Ok(team) => Ok(team),
            // Lost a race against another registration with the same name
            Err(GameError::TeamExists(_)) => self
                .teams
                .read()
                .await
                .iter()
                .find(|t| same_name(&t.name, &cleaned))
                .cloned()
                .ok_or(GameError::InvalidTeamName),
            Err(e) => Err(e),
        }
    }

    /// Remove a team together with its answers.
    ///
    /// Team ids can be handed out again, so nothing keyed by the old id may
    /// survive the team.
    pub async fn remove_team(&self, team_id: TeamId) -> GameResult<Team> {
        let mut teams = self.teams.write().await;
        let index = teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or(GameError::TeamNotFound(team_id))?;
        let team = teams.remove(index);

        let mut answers = self.answers.write().await;
        let mut graded = self.graded_fields.write().await;
        answers.retain(|(_, id), _| *id != team_id);
        graded.retain(|(_, id, _)| *id != team_id);

        tracing::info!("Team removed: {} ({})", team.name, team.id);
        Ok(team)
    }

    pub async fn rename_team(&self, team_id: TeamId, name: &str) -> GameResult<Team> {
        let name = clean_name(name)?;
        let mut teams = self.teams.write().await;

        if teams
            .iter()
            .any(|t| t.id != team_id && same_name(&t.name, &name))
        {
            return Err(GameError::TeamExists(name));
        }

        let team = teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or(GameError::TeamNotFound(team_id))?;
        team.name = name;
        Ok(team.clone())
    }

    /// Adjust a team's score; never drops below zero
    pub async fn update_score(&self, team_id: TeamId, delta: i64) -> GameResult<Team> {
        let mut teams = self.teams.write().await;
        let team = teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or(GameError::TeamNotFound(team_id))?;

        let new_score = i64::from(team.score)
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX));
        team.score = new_score as u32;
        Ok(team.clone())
    }

    pub async fn reset_scores(&self) -> Vec<Team> {
        let mut teams = self.teams.write().await;
        for team in teams.iter_mut() {
            team.score = 0;
        }
        teams.clone()
    }

    /// Remove every team and all answers
    pub async fn clear_teams(&self) {
        let mut teams = self.teams.write().await;
        let mut answers = self.answers.write().await;
        let mut graded = self.graded_fields.write().await;
        teams.clear();
        answers.clear();
        graded.clear();
        tracing::info!("All teams cleared");
    }
}
