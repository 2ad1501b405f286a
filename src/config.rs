//! Server configuration from environment variables (and `.env`)

use crate::grader::DEFAULT_THRESHOLD;
use crate::types::{AccessCodes, GameConfig, DEFAULT_ACCESS_CODE, DEFAULT_ADMIN_PIN};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// JSON song catalog; the built-in catalog is used when unset
    pub songs_path: Option<PathBuf>,
    pub grading_threshold: usize,
    pub access_codes: AccessCodes,
    pub access_gate_enabled: bool,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let addr = match non_empty_var("COVERQUIZ_ADDR") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid COVERQUIZ_ADDR '{}', falling back to {}",
                    value,
                    DEFAULT_ADDR
                );
                default_addr()
            }),
            None => default_addr(),
        };

        let grading_threshold = match non_empty_var("GRADING_THRESHOLD") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid GRADING_THRESHOLD '{}', falling back to {}",
                    value,
                    DEFAULT_THRESHOLD
                );
                DEFAULT_THRESHOLD
            }),
            None => DEFAULT_THRESHOLD,
        };

        let access_codes = AccessCodes {
            access_code: non_empty_var("ACCESS_CODE")
                .unwrap_or_else(|| DEFAULT_ACCESS_CODE.to_string()),
            admin_pin: non_empty_var("ADMIN_PIN").unwrap_or_else(|| DEFAULT_ADMIN_PIN.to_string()),
        };
        if access_codes.admin_pin == DEFAULT_ADMIN_PIN {
            tracing::warn!("Using the default admin PIN; set ADMIN_PIN before going live");
        }

        // Only an explicit opt-out turns the gate off
        let access_gate_enabled = !std::env::var("ACCESS_GATE_DISABLED")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);

        let config = Self {
            addr,
            songs_path: non_empty_var("SONGS_PATH").map(PathBuf::from),
            grading_threshold,
            access_codes,
            access_gate_enabled,
        };

        tracing::info!(
            addr = %config.addr,
            grading_threshold = config.grading_threshold,
            access_gate_enabled = config.access_gate_enabled,
            "Server config loaded"
        );
        config
    }

    /// Settings for newly created games
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            grading_threshold: self.grading_threshold,
            ..GameConfig::default()
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
