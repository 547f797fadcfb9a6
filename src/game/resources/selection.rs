//! Selection state for the piece currently held by the player

use crate::game::codec::{Square, SquareSet};
use crate::game::components::Piece;

/// The currently selected piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub square: Square,
    pub piece: Piece,
    /// Pointer is still held down on the piece
    pub dragging: bool,
}

/// Selection plus the legal targets the oracle reported for it
#[derive(Debug, Default, Clone)]
pub struct SelectionState {
    pub selected: Option<Selection>,
    /// Empty until the target query for the selection returns
    pub targets: SquareSet,
    /// Whether `targets` holds the oracle's answer for the current selection
    pub targets_known: bool,
    pub hovered: Option<Square>,
}

impl SelectionState {
    pub fn select(&mut self, square: Square, piece: Piece) {
        self.selected = Some(Selection {
            square,
            piece,
            dragging: true,
        });
        self.targets = SquareSet::EMPTY;
        self.targets_known = false;
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.targets = SquareSet::EMPTY;
        self.targets_known = false;
    }

    pub fn set_targets(&mut self, targets: SquareSet) {
        self.targets = targets;
        self.targets_known = true;
    }

    /// Whether a drop on `square` can be refused without asking the oracle
    pub fn rules_out(&self, square: Square) -> bool {
        self.targets_known && !self.targets.contains(square)
    }

    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }

    pub fn origin(&self) -> Option<Square> {
        self.selected.map(|selection| selection.square)
    }

    pub fn is_dragging(&self) -> bool {
        self.selected.is_some_and(|selection| selection.dragging)
    }

    pub fn drop_piece(&mut self) {
        if let Some(selection) = self.selected.as_mut() {
            selection.dragging = false;
        }
    }
}
