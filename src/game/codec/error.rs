//! Error types for the position codec

/// Reasons a position code is rejected
///
/// Decoding is all-or-nothing: any of these leaves the caller's current
/// position untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Nothing to decode
    #[error("Position code is empty")]
    Empty,

    /// Placement describes more than 64 cells
    #[error("Placement overruns the board: {cells} cells described, 64 expected")]
    Overrun { cells: usize },

    /// Placement ends before all 64 cells are described
    #[error("Placement underruns the board: {cells} cells described, 64 expected")]
    Underrun { cells: usize },

    /// Empty-run digit outside 1-8
    #[error("Invalid empty-square run '{digit}' (must be 1-8)")]
    InvalidRun { digit: char },

    /// Character that is neither a piece, a run length nor a rank separator
    #[error("Unknown placement symbol '{symbol}'")]
    UnknownSymbol { symbol: char },
}

/// Result type alias for codec operations
pub type DecodeResult<T> = Result<T, DecodeError>;
