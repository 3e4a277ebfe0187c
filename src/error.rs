use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid board notation: {0}")]
    InvalidBoardNotation(String),

    #[error("Hand must be exactly 2 cards")]
    InvalidHandSize,

    #[error("Board must hold 3 to 5 cards, got {0}")]
    InvalidBoardSize(usize),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
