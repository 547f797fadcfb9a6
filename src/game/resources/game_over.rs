//! Game outcome tracking
//!
//! Tracks the two end-game conditions the session can observe and provides
//! methods for determining the winner and displaying results.
//!
//! ## Checkmate
//! - **WhiteWon**: the oracle reports Black, to move, is checkmated
//! - **BlackWon**: the oracle reports White, to move, is checkmated
//!
//! ## Time Control
//! - **WhiteWonByTime**: Black's clock ran out
//! - **BlackWonByTime**: White's clock ran out
//!
//! All non-`InProgress` values are terminal: input is disabled, the clocks
//! are frozen and late oracle responses are discarded.

use crate::game::components::PieceColor;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    #[default]
    InProgress,
    WhiteWon,
    BlackWon,
    WhiteWonByTime,
    BlackWonByTime,
}

impl GameOutcome {
    /// Outcome when the side to move has been checkmated
    pub fn checkmate(mated: PieceColor) -> Self {
        match mated {
            PieceColor::White => GameOutcome::BlackWon,
            PieceColor::Black => GameOutcome::WhiteWon,
        }
    }

    /// Outcome when `flagged` ran out of time
    pub fn timeout(flagged: PieceColor) -> Self {
        match flagged {
            PieceColor::White => GameOutcome::BlackWonByTime,
            PieceColor::Black => GameOutcome::WhiteWonByTime,
        }
    }

    pub fn is_game_over(&self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    pub fn winner(&self) -> Option<PieceColor> {
        match self {
            GameOutcome::WhiteWon | GameOutcome::WhiteWonByTime => Some(PieceColor::White),
            GameOutcome::BlackWon | GameOutcome::BlackWonByTime => Some(PieceColor::Black),
            GameOutcome::InProgress => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            GameOutcome::WhiteWonByTime | GameOutcome::BlackWonByTime
        )
    }

    pub fn is_checkmate(&self) -> bool {
        matches!(self, GameOutcome::WhiteWon | GameOutcome::BlackWon)
    }

    /// Human-readable description of the result
    pub fn message(&self) -> &'static str {
        match self {
            GameOutcome::InProgress => "Game in progress",
            GameOutcome::WhiteWon => "White wins by checkmate!",
            GameOutcome::BlackWon => "Black wins by checkmate!",
            GameOutcome::WhiteWonByTime => "White wins on time!",
            GameOutcome::BlackWonByTime => "Black wins on time!",
        }
    }

    /// Short banner naming the winner, e.g. `White won!`
    pub fn banner(&self) -> Option<String> {
        self.winner().map(|color| format!("{} won!", color.name()))
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
