//! Spot store: the grid cells that make up the board.
//!
//! A [`Spot`] is pure data; all synchronization lives in the board. The
//! invariants that must hold between operations are:
//!
//! - a spot with no card is face-down and uncontrolled,
//! - a controlled spot is always face-up.

use crate::card::{Card, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single grid cell: an optional card, a visibility flag, and an
/// optional controlling player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spot {
    /// The card at this position, if not yet removed.
    pub card: Option<Card>,
    /// Whether the card is currently showing.
    pub face_up: bool,
    /// The player holding this card, if any.
    pub controller: Option<PlayerId>,
}

impl Spot {
    /// Creates a face-down, uncontrolled spot holding `card`.
    pub fn new(card: Card) -> Self {
        Self {
            card: Some(card),
            face_up: false,
            controller: None,
        }
    }

    /// Checks whether `player` currently controls this spot.
    pub fn is_controlled_by(&self, player: &str) -> bool {
        self.controller.as_deref() == Some(player)
    }

    /// Removes the card permanently. Removal is irreversible.
    pub fn remove(&mut self) {
        self.card = None;
        self.face_up = false;
        self.controller = None;
    }

    /// How this spot looks to `player`.
    pub fn view_for(&self, player: &str) -> SpotView {
        match (&self.card, self.face_up) {
            (None, _) => SpotView::None,
            (Some(_), false) => SpotView::Down,
            (Some(card), true) if self.is_controlled_by(player) => SpotView::My(card.clone()),
            (Some(card), true) => SpotView::Up(card.clone()),
        }
    }

    /// Checks the spot invariants.
    pub fn invariant_holds(&self) -> bool {
        if self.card.is_none() && (self.face_up || self.controller.is_some()) {
            return false;
        }
        if self.controller.is_some() && !self.face_up {
            return false;
        }
        true
    }
}

/// What one cell looks like to a particular player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotView {
    /// The card was removed.
    None,
    /// A card is present but face-down.
    Down,
    /// A face-up card held by the observing player.
    My(Card),
    /// A face-up card held by someone else, or by no one.
    Up(Card),
}

impl fmt::Display for SpotView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpotView::None => write!(f, "none"),
            SpotView::Down => write!(f, "down"),
            SpotView::My(card) => write!(f, "my {card}"),
            SpotView::Up(card) => write!(f, "up {card}"),
        }
    }
}
