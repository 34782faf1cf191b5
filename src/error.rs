//! Error taxonomy surfaced by the trade negotiation engine.
//!
//! Five failure kinds cross the service boundary. `NotFound`, `Forbidden`
//! and `InvalidOperation` are caller mistakes and must never be retried.
//! `Conflict` means the caller lost a race on one record and may retry once
//! after re-reading. `Unavailable` means storage failed mid-call; the engine
//! guarantees no partially applied state on that path, so the whole call may
//! be retried.

#[derive(thiserror::Error, Debug)]
pub enum TradeError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("conflicting update on trade {0}; re-read and retry")]
    Conflict(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("invalid or expired credential token")]
    Unauthenticated,
}

impl From<sled::Error> for TradeError {
    fn from(err: sled::Error) -> Self {
        TradeError::Unavailable(err.to_string())
    }
}
