//! Access codes for players and the admin PIN

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::AccessCodes;
use rand::Rng;

const CODE_CHARS: &[u8] = b"0123456789";
const CODE_LENGTH: usize = 4;

/// Random numeric access code, easy to type on a phone
fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

impl AppState {
    pub async fn get_access_codes(&self) -> AccessCodes {
        self.access_codes.read().await.clone()
    }

    /// Change both codes. Connected clients stay connected.
    pub async fn set_access_codes(
        &self,
        access_code: &str,
        admin_pin: &str,
    ) -> GameResult<AccessCodes> {
        let access_code = access_code.trim();
        let admin_pin = admin_pin.trim();
        if access_code.is_empty() || admin_pin.is_empty() {
            return Err(GameError::InvalidAccessCode);
        }

        let mut codes = self.access_codes.write().await;
        codes.access_code = access_code.to_string();
        codes.admin_pin = admin_pin.to_string();
        tracing::info!("Access codes changed");
        Ok(codes.clone())
    }

    /// Replace the player/display code with a fresh random one
    pub async fn rotate_access_code(&self) -> AccessCodes {
        let mut codes = self.access_codes.write().await;
        // Never collide with the admin PIN, or players could not be told apart
        let code = loop {
            let code = generate_access_code();
            if code != codes.admin_pin {
                break code;
            }
        };
        codes.access_code = code;
        tracing::info!("Access code rotated");
        codes.clone()
    }
}
