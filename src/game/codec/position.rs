//! Position decoding from the oracle's compact position code
//!
//! The code is `<placement> <sideToMove> ...`, space delimited. Placement
//! walks the board from the top row to the bottom row, left file to right
//! file; each character is a piece symbol, an empty-run digit `1`-`8`, or a
//! `/` rank separator that produces no cells. The side token `w` means White
//! to move; any other token, or none, means Black.

use super::error::{DecodeError, DecodeResult};
use super::square::Square;
use crate::game::components::{Piece, PieceColor};
use std::fmt;

/// Board grid plus side to move
///
/// Immutable once decoded; a new code always produces a whole new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Indexed `[rank][file]`
    cells: [[Option<Piece>; 8]; 8],
    side_to_move: PieceColor,
}

impl Position {
    /// Decode a position code; see the module docs for the format
    pub fn decode(code: &str) -> DecodeResult<Self> {
        let mut fields = code.split_whitespace();
        let placement = fields.next().ok_or(DecodeError::Empty)?;
        let side_to_move = match fields.next() {
            Some("w") => PieceColor::White,
            _ => PieceColor::Black,
        };

        let mut cells = [[None; 8]; 8];
        let mut filled = 0usize;

        for symbol in placement.chars() {
            match symbol {
                '/' => {}
                '1'..='8' => {
                    let run = symbol as usize - '0' as usize;
                    if filled + run > Square::COUNT {
                        return Err(DecodeError::Overrun {
                            cells: filled + run,
                        });
                    }
                    filled += run;
                }
                '0' | '9' => return Err(DecodeError::InvalidRun { digit: symbol }),
                _ => {
                    let piece =
                        Piece::from_symbol(symbol).ok_or(DecodeError::UnknownSymbol { symbol })?;
                    if filled >= Square::COUNT {
                        return Err(DecodeError::Overrun { cells: filled + 1 });
                    }
                    cells[filled / 8][filled % 8] = Some(piece);
                    filled += 1;
                }
            }
        }

        if filled < Square::COUNT {
            return Err(DecodeError::Underrun { cells: filled });
        }

        Ok(Self {
            cells,
            side_to_move,
        })
    }

    /// Encode back to a position code (`/` separated placement, `w`/`b` side)
    pub fn encode(&self) -> String {
        let mut code = String::with_capacity(72);
        for (rank, row) in self.cells.iter().enumerate() {
            if rank > 0 {
                code.push('/');
            }
            let mut empty = 0u8;
            for cell in row {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            code.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        code.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                code.push(char::from(b'0' + empty));
            }
        }
        code.push(' ');
        code.push(match self.side_to_move {
            PieceColor::White => 'w',
            PieceColor::Black => 'b',
        });
        code
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.side_to_move
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cells[usize::from(square.rank())][usize::from(square.file())]
    }

    /// Occupied squares in ascending index order
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|cell| cell.map_or('.', Piece::symbol))
                .collect();
            writeln!(f, "{line}")?;
        }
        write!(f, "{} to move", self.side_to_move)
    }
}

/// Decode a position code
pub fn decode(code: &str) -> DecodeResult<Position> {
    Position::decode(code)
}

/// Encode a position back into a position code
pub fn encode(position: &Position) -> String {
    position.encode()
}
