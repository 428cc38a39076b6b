//! The shared game board and its four operations.
//!
//! All state lives behind one [`tokio::sync::Mutex`], which hands the
//! lock to waiters in FIFO arrival order, so no caller starves. Every
//! operation acquires it before touching spots and releases it before
//! suspending or returning. The only computation that runs unlocked is
//! the caller-supplied transform in the compute phase of [`Board::map`],
//! which touches no shared state.

use crate::card::{Card, PlayerId, validate_player};
use crate::error::BoardError;
use crate::registry::{ChangeWatchers, SpotWaiters, WakeReceiver};
use crate::spot::Spot;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// A completed turn awaiting cleanup on the player's next flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FinishedTurn {
    /// The two positions the player revealed this turn.
    positions: [(usize, usize); 2],
    /// Whether the two cards matched.
    matched: bool,
}

/// Outcome of one pass through the flip protocol.
enum FlipStep {
    /// The card was taken; the turn may or may not be complete.
    Taken,
    /// The target is controlled by another player; suspend on the
    /// receiver, then retry the whole protocol.
    Wait(WakeReceiver),
}

/// Everything guarded by the board lock.
#[derive(Debug)]
struct BoardState {
    rows: usize,
    cols: usize,
    /// Spots in row-major order.
    spots: Vec<Spot>,
    /// Completed turns pending cleanup, keyed by player.
    finished: HashMap<PlayerId, FinishedTurn>,
    /// Callers suspended on a contested position.
    waiters: SpotWaiters,
    /// One-shot change subscriptions.
    watchers: ChangeWatchers,
}

/// A shared, concurrently-accessed memory game board.
///
/// Many independent players flip cards, watch for changes, and rewrite
/// card values at the same time. The board is safe for indefinite
/// concurrent sharing; wrap it in an [`std::sync::Arc`] and clone the
/// handle per caller.
#[derive(Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    state: Mutex<BoardState>,
}

// ─────────────────────────────────────────────────────────────
//  Construction and reads
// ─────────────────────────────────────────────────────────────

impl Board {
    /// Creates a board from dimensions and a row-major card sequence.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidDimensions`] if either dimension is
    /// zero, or [`BoardError::CardCountMismatch`] if the sequence length
    /// is not `rows * cols`.
    #[instrument(skip(cards))]
    pub fn new(rows: usize, cols: usize, cards: Vec<Card>) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::InvalidDimensions { rows, cols });
        }
        let expected = rows
            .checked_mul(cols)
            .ok_or(BoardError::InvalidDimensions { rows, cols })?;
        if cards.len() != expected {
            return Err(BoardError::CardCountMismatch {
                expected,
                actual: cards.len(),
            });
        }

        info!(rows, cols, "Creating board");
        Ok(Self {
            rows,
            cols,
            state: Mutex::new(BoardState {
                rows,
                cols,
                spots: cards.into_iter().map(Spot::new).collect(),
                finished: HashMap::new(),
                waiters: SpotWaiters::default(),
                watchers: ChangeWatchers::default(),
            }),
        })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Renders the board as seen by `player`: one line per cell in
    /// row-major order, each `none`, `down`, `my <card>`, or `up <card>`.
    ///
    /// Never mutates state.
    #[instrument(skip(self))]
    pub async fn look(&self, player: &str) -> Result<String, BoardError> {
        validate_player(player)?;
        let state = self.state.lock().await;
        Ok(state.render_for(player))
    }

    /// Checks the spot invariants across the whole grid. Intended for
    /// tests and debugging; always `true` between operations.
    pub async fn invariants_hold(&self) -> bool {
        let state = self.state.lock().await;
        state.spots.iter().all(Spot::invariant_holds)
    }
}

// ─────────────────────────────────────────────────────────────
//  Flip: the turn state machine
// ─────────────────────────────────────────────────────────────

impl Board {
    /// Flips the card at `(row, col)` for `player`.
    ///
    /// Runs the cleanup pass for the player's previous completed turn,
    /// validates the target, then takes the card as a first or second
    /// card. Taking a first card that another player controls suspends
    /// until that control is released, then re-runs the whole protocol.
    ///
    /// # Errors
    ///
    /// Fails synchronously on out-of-bounds coordinates, an empty cell,
    /// re-flipping an own held card, an already-complete turn, or a
    /// second card held by another player. Validation precedes mutation,
    /// so a failed flip never leaves a partially mutated turn.
    #[instrument(skip(self))]
    pub async fn flip(&self, player: &str, row: usize, col: usize) -> Result<(), BoardError> {
        validate_player(player)?;
        loop {
            let mut state = self.state.lock().await;
            let cleaned = state.run_cleanup(player);

            match state.flip_step(player, row, col) {
                Ok(FlipStep::Taken) => {
                    state.watchers.notify_all();
                    return Ok(());
                }
                Ok(FlipStep::Wait(wake)) => {
                    if cleaned {
                        state.watchers.notify_all();
                    }
                    drop(state);
                    debug!(player, row, col, "Waiting for contested position");
                    // A dropped sender still resumes us; the retry
                    // re-validates everything anyway.
                    let _ = wake.await;
                    debug!(player, row, col, "Resumed, revalidating flip");
                }
                Err(error) => {
                    if cleaned {
                        state.watchers.notify_all();
                    }
                    warn!(player, row, col, %error, "Flip rejected");
                    return Err(error);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Watch and map
// ─────────────────────────────────────────────────────────────

impl Board {
    /// Suspends until the next observable board change, then returns a
    /// fresh rendering for `player`.
    ///
    /// The subscription is single-use: each call observes exactly one
    /// future change, and continuous monitoring means calling `watch`
    /// again in a loop. On a permanently quiescent board this suspends
    /// indefinitely.
    #[instrument(skip(self))]
    pub async fn watch(&self, player: &str) -> Result<String, BoardError> {
        validate_player(player)?;
        let wake = {
            let mut state = self.state.lock().await;
            state.watchers.subscribe()
        };
        debug!(player, "Watching for next change");
        let _ = wake.await;
        self.look(player).await
    }

    /// Rewrites every card on the board to `f(card)`, preserving
    /// visibility and control, and returns the post-apply rendering.
    ///
    /// `f` must be a pure function of its input and is invoked exactly
    /// once per distinct card value, outside the lock, so a slow
    /// transform never stalls other players. Cards that appear, change,
    /// or vanish between the snapshot and the apply phase are handled
    /// gracefully: the apply phase only rewrites values that are present
    /// at apply time and have a computed image.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidCard`] if `f` produces an empty or
    /// whitespace-containing token; the board is left untouched.
    #[instrument(skip(self, f))]
    pub async fn map<F, Fut>(&self, player: &str, f: F) -> Result<String, BoardError>
    where
        F: Fn(Card) -> Fut,
        Fut: Future<Output = String>,
    {
        validate_player(player)?;

        // Snapshot phase: the distinct card values currently present.
        let distinct: BTreeSet<Card> = {
            let state = self.state.lock().await;
            state
                .spots
                .iter()
                .filter_map(|spot| spot.card.clone())
                .collect()
        };
        debug!(player, values = distinct.len(), "Snapshot taken");

        // Compute phase, unlocked: once per distinct value, never once
        // per cell. Other operations interleave freely here.
        let mut mapping = HashMap::with_capacity(distinct.len());
        for card in distinct {
            let image = Card::new(f(card.clone()).await)?;
            mapping.insert(card, image);
        }

        // Apply phase: rewrite atomically and notify once.
        let mut state = self.state.lock().await;
        let mut changed = false;
        for spot in &mut state.spots {
            let Some(card) = spot.card.clone() else {
                continue;
            };
            if let Some(image) = mapping.get(&card)
                && *image != card
            {
                spot.card = Some(image.clone());
                changed = true;
            }
        }
        if changed {
            state.watchers.notify_all();
        }
        info!(player, changed, "Transform applied");
        Ok(state.render_for(player))
    }
}

// ─────────────────────────────────────────────────────────────
//  Locked-state operations
// ─────────────────────────────────────────────────────────────

impl BoardState {
    /// Row-major index for `(row, col)`, if in bounds.
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Indices of spots currently controlled by `player`.
    fn held_by(&self, player: &str) -> Vec<usize> {
        self.spots
            .iter()
            .enumerate()
            .filter(|(_, spot)| spot.is_controlled_by(player))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Cleans up the player's previous completed turn, if any.
    ///
    /// A matched pair is removed for good; a mismatched pair is turned
    /// face-down, skipping any cell another player has taken control of
    /// in the meantime. Returns whether anything changed.
    fn run_cleanup(&mut self, player: &str) -> bool {
        let Some(turn) = self.finished.remove(player) else {
            return false;
        };
        let mut changed = false;
        for (row, col) in turn.positions {
            let Some(idx) = self.index(row, col) else {
                continue;
            };
            if turn.matched {
                // Still controlled by the player: nothing can strip a
                // controller, so removal is safe.
                if self.spots[idx].is_controlled_by(player) {
                    self.spots[idx].remove();
                    self.waiters.notify(row, col);
                    changed = true;
                }
            } else {
                // Control was released at mismatch time; only turn the
                // card down if no one else has picked it up since.
                let spot = &mut self.spots[idx];
                if spot.card.is_some() && spot.face_up && spot.controller.is_none() {
                    spot.face_up = false;
                    changed = true;
                }
            }
        }
        if changed {
            info!(player, matched = turn.matched, "Cleaned up finished turn");
        }
        changed
    }

    /// One pass through steps 2-5 of the flip protocol. The cleanup
    /// pass has already run.
    fn flip_step(
        &mut self,
        player: &str,
        row: usize,
        col: usize,
    ) -> Result<FlipStep, BoardError> {
        let idx = self.index(row, col).ok_or(BoardError::OutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        })?;
        if self.spots[idx].card.is_none() {
            return Err(BoardError::NoCard { row, col });
        }
        if self.spots[idx].is_controlled_by(player) {
            return Err(BoardError::AlreadyHeld { row, col });
        }

        let held = self.held_by(player);
        if held.len() >= 2 {
            return Err(BoardError::TurnComplete);
        }
        let is_second = held.len() == 1;

        if self.spots[idx].controller.is_some() {
            if is_second {
                // A second card is never taken from another player.
                return Err(BoardError::Contended { row, col });
            }
            return Ok(FlipStep::Wait(self.waiters.register(row, col)));
        }

        self.spots[idx].face_up = true;
        self.spots[idx].controller = Some(player.to_string());
        debug!(player, row, col, is_second, "Card taken");

        if is_second {
            let first_idx = held[0];
            let (first_row, first_col) = self.position(first_idx);
            let matched = self.spots[first_idx].card == self.spots[idx].card;
            if matched {
                // Both stay under the player's control until the next
                // flip removes them.
                info!(player, "Pair matched");
            } else {
                // Visibly lost: release both immediately, leave them
                // face-up until the player's next flip.
                self.spots[first_idx].controller = None;
                self.spots[idx].controller = None;
                self.waiters.notify(first_row, first_col);
                self.waiters.notify(row, col);
                info!(player, "Pair mismatched, control released");
            }
            self.finished.insert(
                player.to_string(),
                FinishedTurn {
                    positions: [(first_row, first_col), (row, col)],
                    matched,
                },
            );
        }
        Ok(FlipStep::Taken)
    }

    /// Position of a row-major index.
    fn position(&self, idx: usize) -> (usize, usize) {
        (idx / self.cols, idx % self.cols)
    }

    /// One line per cell, row-major, as seen by `player`.
    fn render_for(&self, player: &str) -> String {
        let mut out = String::new();
        for spot in &self.spots {
            out.push_str(&spot.view_for(player).to_string());
            out.push('\n');
        }
        out
    }
}
