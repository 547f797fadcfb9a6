//! Which colors the human at this client controls

use super::piece::PieceColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side selection for a session
///
/// `Both` is local hot-seat play, `Neither` is spectating an engine-vs-engine
/// game. Every color the human does not control is played by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    #[default]
    White,
    Black,
    Both,
    Neither,
}

impl PlayerSide {
    /// Whether the human moves the pieces of `color`
    pub fn controls(self, color: PieceColor) -> bool {
        match self {
            PlayerSide::White => color == PieceColor::White,
            PlayerSide::Black => color == PieceColor::Black,
            PlayerSide::Both => true,
            PlayerSide::Neither => false,
        }
    }
}

impl From<PieceColor> for PlayerSide {
    fn from(color: PieceColor) -> Self {
        match color {
            PieceColor::White => PlayerSide::White,
            PieceColor::Black => PlayerSide::Black,
        }
    }
}

impl fmt::Display for PlayerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerSide::White => "white",
            PlayerSide::Black => "black",
            PlayerSide::Both => "both",
            PlayerSide::Neither => "neither",
        };
        f.write_str(name)
    }
}

impl FromStr for PlayerSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(PlayerSide::White),
            "black" | "b" => Ok(PlayerSide::Black),
            "both" => Ok(PlayerSide::Both),
            "neither" | "none" => Ok(PlayerSide::Neither),
            other => Err(format!(
                "unknown side '{other}' (expected white, black, both or neither)"
            )),
        }
    }
}
