//! Memory Scramble board - a shared, concurrently-accessed card grid.
//!
//! Many independent players flip face-down cards on the same board,
//! looking for matching pairs, while others watch for changes or rewrite
//! card values in bulk. The interesting part is the synchronization
//! discipline, not the game logic:
//!
//! - **Exclusion**: one fair async lock guards all board state.
//! - **Blocking flips**: taking a first card that another player holds
//!   suspends until that control is released, then re-validates.
//! - **Deferred cleanup**: a finished turn is resolved at the start of
//!   the player's *next* flip, not by a timer.
//! - **Watch**: one-shot subscriptions resolve on the next observable
//!   change.
//! - **Map**: bulk transforms snapshot under the lock, compute the
//!   caller's function unlocked (once per distinct value), and apply
//!   atomically.
//!
//! # Example
//!
//! ```
//! use memory_scramble::{Board, Card};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), memory_scramble::BoardError> {
//! let cards = ["A", "A", "B", "B"]
//!     .into_iter()
//!     .map(Card::new)
//!     .collect::<Result<Vec<_>, _>>()?;
//! let board = Board::new(2, 2, cards)?;
//!
//! board.flip("alice", 0, 0).await?;
//! board.flip("alice", 0, 1).await?;
//! assert!(board.look("alice").await?.starts_with("my A\nmy A\n"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod board;
mod card;
mod error;
mod registry;
mod spot;

// Crate-level exports - the board and its operations
pub use board::Board;

// Crate-level exports - domain types
pub use card::{Card, PlayerId};
pub use spot::SpotView;

// Crate-level exports - errors
pub use error::BoardError;
