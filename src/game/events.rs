//! Notifications emitted by a session for its presentation layer

use crate::game::codec::Square;
use crate::game::components::{PieceColor, PlayerSide};
use crate::game::resources::GameOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new game was requested; the setup position is on its way
    SessionStarted { side: PlayerSide },

    /// A new authoritative position replaced the board
    PositionChanged { side_to_move: PieceColor },

    /// `by` completed a move and the clocks were reconciled
    MovePlayed { by: PieceColor },

    /// A submitted move was refused, locally or by the oracle
    IllegalMove { from: Square, to: Square },

    GameOver { outcome: GameOutcome },
}
