//! Session resources - the state a game session owns
//!
//! # Resource Categories
//!
//! ## Turn Management
//! - [`TurnPhase`] - Turn sub-states (Idle, Selecting, OracleTurn, ...)
//! - [`SolicitationGuard`] - Single outstanding oracle call, generation tagged
//!
//! ## Player Interaction
//! - [`SelectionState`] - Currently selected piece and its legal targets
//!
//! ## Game Timing
//! - [`DualClock`] - Per-color countdown with optional Fischer increment
//!
//! ## Game Status
//! - [`GameOutcome`] - Checkmate and timeout results

pub mod game_over;
pub mod selection;
pub mod turn;

pub use game_over::GameOutcome;
pub use selection::{Selection, SelectionState};
pub use turn::*;
