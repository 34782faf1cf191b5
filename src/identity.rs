//! Identity seam between the service boundary and whatever authenticates
//! callers. The engine itself never sees tokens; the resolved user id is
//! passed explicitly through every core call.
use super::error::TradeError;
use super::utils;
use std::collections::HashMap;
use std::sync::Mutex;

pub trait IdentityService {
    /// Resolve a credential token to a stable user id, or
    /// `Unauthenticated` if the token is unknown.
    fn authenticate(&self, token: &str) -> Result<String, TradeError>;
}

/// In-memory session token registry, enough for embedding the engine and
/// for tests. A real deployment would put a JWT verifier behind the same
/// trait.
#[derive(Default)]
pub struct TokenRegistry {
    sessions: Mutex<HashMap<String, String>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh session token for a user id.
    pub fn issue(&self, user_id: &str) -> Result<String, TradeError> {
        let token = utils::mint_id("session_")
            .map_err(|err| TradeError::Unavailable(err.to_string()))?;
        self.sessions
            .lock()
            .map_err(|_| TradeError::Unavailable("session registry poisoned".into()))?
            .insert(token.clone(), user_id.to_string());
        Ok(token)
    }
}

impl IdentityService for TokenRegistry {
    fn authenticate(&self, token: &str) -> Result<String, TradeError> {
        self.sessions
            .lock()
            .map_err(|_| TradeError::Unavailable("session registry poisoned".into()))?
            .get(token)
            .cloned()
            .ok_or(TradeError::Unauthenticated)
    }
}
