//! Value types shared across the session: pieces, colors and side selection

pub mod piece;
pub mod player;

pub use piece::*;
pub use player::*;
