//! Board error types.

use derive_more::{Display, Error};

/// Errors raised by board construction and board operations.
///
/// Every error is scoped to the call that raised it; the board remains
/// usable afterwards. Waiting on a contested position is not an error,
/// it is the normal blocking path of [`crate::Board::flip`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Board dimensions must both be positive.
    #[display("invalid board dimensions {rows}x{cols}")]
    InvalidDimensions {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },
    /// The card sequence length did not match `rows * cols`.
    #[display("expected {expected} cards, got {actual}")]
    CardCountMismatch {
        /// Number of cards the dimensions require.
        expected: usize,
        /// Number of cards supplied.
        actual: usize,
    },
    /// A card token was empty or contained whitespace.
    #[display("invalid card token {token:?}")]
    InvalidCard {
        /// The offending token.
        token: String,
    },
    /// The player token was empty.
    #[display("player token must be non-empty")]
    EmptyPlayer,
    /// Coordinates outside the grid.
    #[display("position ({row},{col}) is outside the {rows}x{cols} board")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Board row count.
        rows: usize,
        /// Board column count.
        cols: usize,
    },
    /// The target cell has no card (the pair was already removed).
    #[display("no card at ({row},{col})")]
    NoCard {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// The player already controls this face-up card.
    #[display("card at ({row},{col}) is already held by you")]
    AlreadyHeld {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// The player already controls two face-up cards.
    #[display("turn already complete; flip again to start a new turn")]
    TurnComplete,
    /// A second card cannot be taken while another player controls it.
    #[display("card at ({row},{col}) is held by another player")]
    Contended {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
}
