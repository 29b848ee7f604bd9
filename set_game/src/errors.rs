//! Error types for game setup and thread lifecycle.

use thiserror::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The game needs at least one player
    #[error("At least one player is required")]
    NoPlayers,

    /// Board must have room for at least one set
    #[error("Board size {board_size} cannot hold a set of {set_size} cards")]
    BoardTooSmall { board_size: usize, set_size: usize },

    /// A set needs at least two cards
    #[error("Set size must be at least 2, got {0}")]
    SetSizeTooSmall(usize),

    /// Deck size must match the feature space
    #[error("Deck size {actual} does not match {set_size}^{feature_count} = {expected}")]
    DeckSizeMismatch {
        actual: usize,
        expected: usize,
        set_size: usize,
        feature_count: usize,
    },

    /// Warning threshold must fit inside the turn
    #[error("Turn warning {warning_ms}ms exceeds turn timeout {timeout_ms}ms")]
    WarningExceedsTurn { warning_ms: u64, timeout_ms: u64 },

    /// Turn timeout must be positive
    #[error("Turn timeout must be positive")]
    ZeroTurnTimeout,

    /// Computer players need a pause between presses
    #[error("Computer delay must be positive when computer players are seated")]
    ZeroComputerDelay,

    /// Player name list has the wrong length
    #[error("Expected {expected} player names, got {actual}")]
    PlayerNamesMismatch { expected: usize, actual: usize },
}

/// Result type for running a game
pub type GameResult<T> = Result<T, GameError>;

/// Game lifecycle errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration rejected before start
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// OS refused to spawn a thread
    #[error("Failed to spawn thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A thread panicked before it could be joined cleanly
    #[error("Thread {0} panicked")]
    Panicked(String),
}
