//! Render-ready snapshot of a session
//!
//! [`BoardView`] is what a presentation layer draws each frame: the grid,
//! the dragged piece, selection and hover highlights, target hints, both
//! clocks and the result banner.

use crate::game::codec::Square;
use crate::game::components::{Piece, PieceColor};
use crate::game::resources::TurnPhase;
use std::fmt;

/// Target hint drawn on a legal destination of the selected piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Quiet,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub square: Square,
    /// `None` for empty cells and for the origin of a dragged piece
    pub piece: Option<Piece>,
    pub selected: bool,
    pub hovered: bool,
    pub hint: Option<Hint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// 64 cells in square index order; empty before the setup position arrives
    pub cells: Vec<CellView>,
    pub side_to_move: Option<PieceColor>,
    /// Piece following the pointer, drawn apart from the grid
    pub dragged: Option<Piece>,
    pub white_clock: String,
    pub black_clock: String,
    pub banner: Option<String>,
    pub phase: TurnPhase,
}

impl BoardView {
    pub fn cell(&self, square: Square) -> Option<&CellView> {
        self.cells.get(usize::from(square.index()))
    }

    pub fn hints(&self) -> impl Iterator<Item = (Square, Hint)> + '_ {
        self.cells
            .iter()
            .filter_map(|cell| cell.hint.map(|hint| (cell.square, hint)))
    }
}

impl fmt::Display for BoardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Black {}", self.black_clock)?;
        for row in self.cells.chunks(8) {
            let line: String = row
                .iter()
                .map(|cell| match (cell.piece, cell.hint) {
                    (Some(piece), _) => piece.symbol(),
                    (None, Some(_)) => '*',
                    (None, None) => '.',
                })
                .collect();
            writeln!(f, "{line}")?;
        }
        write!(f, "White {}", self.white_clock)?;
        if let Some(banner) = &self.banner {
            write!(f, "\n{banner}")?;
        }
        Ok(())
    }
}
