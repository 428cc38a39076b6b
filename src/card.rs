//! Card tokens and player identity.

use crate::error::BoardError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier for a player.
///
/// Player identity is an opaque token supplied by the calling layer;
/// the board only requires it to be non-empty.
pub type PlayerId = String;

/// A card value: non-empty text containing no whitespace.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("{_0}")]
pub struct Card(String);

impl Card {
    /// Creates a card from a token.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidCard`] if the token is empty or
    /// contains whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, BoardError> {
        let token = token.into();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(BoardError::InvalidCard { token });
        }
        Ok(Self(token))
    }

    /// Returns the card token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Card {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Rejects empty player tokens at the operation boundary.
pub(crate) fn validate_player(player: &str) -> Result<(), BoardError> {
    if player.is_empty() {
        return Err(BoardError::EmptyPlayer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_tokens() {
        let card = Card::new("A").unwrap();
        assert_eq!(card.as_str(), "A");
        assert_eq!(card.to_string(), "A");

        let card: Card = "🦀".parse().unwrap();
        assert_eq!(card.as_str(), "🦀");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(
            Card::new(""),
            Err(BoardError::InvalidCard { .. })
        ));
        assert!(matches!(
            Card::new("a b"),
            Err(BoardError::InvalidCard { .. })
        ));
        assert!(matches!(
            Card::new("tab\tted"),
            Err(BoardError::InvalidCard { .. })
        ));
    }

    #[test]
    fn rejects_empty_player() {
        assert!(matches!(validate_player(""), Err(BoardError::EmptyPlayer)));
        assert!(validate_player("alice").is_ok());
    }
}
