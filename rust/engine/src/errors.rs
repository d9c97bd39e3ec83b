use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Illegal action: {0}")]
    IllegalAction(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Hand already complete")]
    HandAlreadyComplete,
    #[error("It's not player {actual}'s turn (expected player {expected})")]
    NotPlayersTurn { expected: usize, actual: usize },
    #[error("Deck exhausted")]
    DeckExhausted,
    #[error("Invalid table configuration: {0}")]
    InvalidTable(String),
    #[error("Invalid card: {0}")]
    InvalidCard(String),
}

impl GameError {
    pub(crate) fn illegal(reason: impl Into<String>) -> Self {
        GameError::IllegalAction(reason.into())
    }

    pub(crate) fn amount(reason: impl Into<String>) -> Self {
        GameError::InvalidAmount(reason.into())
    }
}
