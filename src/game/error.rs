//! Error types for game module
//!
//! Provides custom error types for the session controller: malformed oracle
//! output, oracle failures and turn state misuse.

use crate::game::codec::DecodeError;
use crate::game::oracle::OracleError;
use crate::game::resources::TurnPhase;

/// Errors that can occur while driving a game session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The oracle returned a position code that does not decode
    #[error("Malformed position from oracle: {0}")]
    MalformedPosition(#[from] DecodeError),

    /// The oracle call itself failed
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Invalid turn phase transition
    #[error("Invalid turn phase transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: TurnPhase, to: TurnPhase },
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
