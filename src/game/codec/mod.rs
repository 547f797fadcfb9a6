//! Position codec
//!
//! Turns the oracle's compact outputs into structured values: position codes
//! into [`Position`], target masks into [`SquareSet`] / square sequences.

pub mod error;
pub mod position;
pub mod square;

pub use error::{DecodeError, DecodeResult};
pub use position::{decode, encode, Position};
pub use square::{decode_square_set, Square, SquareSet, SquareSetIter};
