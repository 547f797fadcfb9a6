//! The move oracle seam
//!
//! The session never knows the rules of chess. Everything rule-related
//! (initial setup, legal targets, move legality, applying moves, engine
//! replies, checkmate detection) is delegated to an [`Oracle`], whose
//! results come back as position codes and target masks.
//!
//! Calls are asynchronous and may complete in any order relative to pointer
//! input and clock ticks; the session tags each one with a ticket and drops
//! responses that arrive after the game moved on.

pub mod scripted;

use crate::game::codec::Square;
use crate::game::components::PlayerSide;
use async_trait::async_trait;
use std::fmt;
use std::num::NonZeroU32;

pub use scripted::{GatedCall, OracleCall, Script, ScriptStep, ScriptedOracle};

/// Errors reported by an oracle implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle could not answer (backend gone, script exhausted, ...)
    #[error("Oracle unavailable: {message}")]
    Unavailable { message: String },

    /// The oracle answered with something that breaks the call contract
    #[error("Oracle protocol violation: {message}")]
    Protocol { message: String },
}

/// Result type alias for oracle calls
pub type OracleResult<T> = Result<T, OracleError>;

/// Opaque handle for a move the oracle accepted as legal
///
/// Only meaningful to the oracle that issued it; the raw value is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveHandle(NonZeroU32);

impl MoveHandle {
    /// `None` for the raw value 0, which oracles use to signal an illegal move
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for MoveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// External authority over chess rules
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Position code of the initial setup
    async fn setup(&self) -> OracleResult<String>;

    /// Target mask for the piece on `square`, from the point of view of `side`
    async fn valid_targets(&self, square: Square, side: PlayerSide) -> OracleResult<u64>;

    /// Handle for `from -> to` if legal, `None` otherwise
    async fn validate_move(
        &self,
        from: Square,
        to: Square,
        side: PlayerSide,
    ) -> OracleResult<Option<MoveHandle>>;

    /// Apply a previously validated move; returns the resulting position code
    async fn apply_move(&self, handle: MoveHandle) -> OracleResult<String>;

    /// Let the engine move for the side to move; returns the resulting position code
    ///
    /// `remaining_ms` is the engine side's banked time, `param` the auxiliary
    /// time-control parameter (the per-move increment).
    async fn engine_move(&self, remaining_ms: i64, param: i64) -> OracleResult<String>;

    /// Whether the side to move in the current position is checkmated
    async fn is_checkmate(&self) -> OracleResult<bool>;
}
