//! Turn phase management for the session controller
//!
//! Tracks where the session is within the current turn so that input and
//! oracle solicitation are only accepted when appropriate. This prevents
//! issues like:
//! - Pointer input being honoured while the engine is thinking
//! - A second move submission racing the first
//! - Input after the game has ended

use crate::game::error::{SessionError, SessionResult};
use tracing::{error, trace};

/// Fine-grained turn flow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnPhase {
    /// No selection; waiting for the controlling player to press a piece
    ///
    /// Valid transitions: → Selecting, → Submitting (direct move entry),
    /// → OracleTurn, → Terminal
    #[default]
    Idle,

    /// A piece is selected and its target query may be outstanding
    ///
    /// Valid transitions: → Submitting, → Idle (cancel), → Selecting (reselect),
    /// → Terminal
    Selecting,

    /// A move was submitted and the oracle's verdict is outstanding
    ///
    /// Valid transitions: → Idle (illegal or applied), → OracleTurn, → Terminal
    Submitting,

    /// The side to move is not human-controlled; an engine reply is expected
    ///
    /// Valid transitions: → Idle, → OracleTurn (engine against engine),
    /// → Terminal
    OracleTurn,

    /// Checkmate or timeout; only a new session leaves this phase
    Terminal,
}

impl TurnPhase {
    /// Check if this phase allows pointer input
    pub fn accepts_input(&self) -> bool {
        matches!(self, TurnPhase::Idle | TurnPhase::Selecting)
    }

    /// Check if an engine move should be solicited or is outstanding
    pub fn is_awaiting_oracle(&self) -> bool {
        matches!(self, TurnPhase::OracleTurn)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Terminal)
    }

    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(&self, next: TurnPhase) -> bool {
        use TurnPhase::*;

        match (*self, next) {
            (Terminal, _) => false,
            (_, Terminal) => true,
            (Idle, Idle | Selecting | Submitting | OracleTurn) => true,
            (Selecting, Idle | Selecting | Submitting) => true,
            (Submitting, Idle | OracleTurn) => true,
            (OracleTurn, Idle | OracleTurn) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the turn flow does not allow
    pub fn transition_to(&mut self, next: TurnPhase) -> SessionResult<()> {
        if !self.can_transition_to(next) {
            error!(
                "[TURN_STATE] Invalid turn phase transition: {:?} -> {:?}",
                self, next
            );
            return Err(SessionError::InvalidStateTransition {
                from: *self,
                to: next,
            });
        }

        trace!("[TURN_STATE] {:?} -> {:?}", self, next);
        *self = next;
        Ok(())
    }

    /// Unconditional reset, used when a session starts or ends
    pub fn force(&mut self, next: TurnPhase) {
        trace!("[TURN_STATE] forced {:?} -> {:?}", self, next);
        *self = next;
    }
}
