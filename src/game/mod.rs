//! Chess game session - client-side controller against an external oracle
//!
//! The session holds no chess rules of its own. It turns the oracle's
//! position codes into a board, runs both players' clocks, tracks whose
//! turn it is and what the pointer is doing, and makes sure every oracle
//! answer still belongs to the game it was asked for.
//!
//! # Module Organization
//!
//! - `codec` - Position codes and target masks into structured values
//! - `components` - Plain data types (PieceColor, Piece, PlayerSide)
//! - `resources` - Session-owned state (DualClock, TurnPhase, SelectionState, GameOutcome)
//! - `oracle` - The [`Oracle`] trait and a scripted implementation
//! - `session` - Synchronous core, async orchestrator and real-time driver
//! - `events` - Notifications for the presentation layer

pub mod codec;
pub mod components;
pub mod error;
pub mod events;
pub mod oracle;
pub mod resources;
pub mod session;

pub use codec::{Position, Square, SquareSet};
pub use components::{Piece, PieceColor, PieceKind, PlayerSide};
pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
pub use oracle::{MoveHandle, Oracle, OracleError, OracleResult, ScriptedOracle};
pub use resources::{DualClock, GameOutcome, TurnPhase};
pub use session::{
    BoardView, DriverExit, DriverHandle, IngestReport, MoveSubmission, PointerOutcome, Session,
    SessionCommand, SessionDriver,
};
