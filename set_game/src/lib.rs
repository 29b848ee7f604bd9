//! # Set Game
//!
//! A concurrent table for the card game SET: one dealer thread, one thread per
//! player, and a shared board that all of them touch at once.
//!
//! ## Architecture
//!
//! - **Board**: slot↔card mapping plus per-slot player markers, locked per slot
//! - **Claims**: FIFO of "I think I have a set" signals, consumed by the dealer
//! - **Players**: actor threads fed by human input or a random generator
//! - **Dealer**: deals, runs the round countdown, judges one claim at a time,
//!   and rewards or penalizes with a freeze
//!
//! A round ends when the countdown runs out, or early when the deck is empty
//! and no set is left on the board. The game ends once no set can be formed
//! from the remaining cards, after which every player with the top score is
//! announced as a winner.
//!
//! ## Example
//!
//! ```no_run
//! use set_game::{Game, GameConfig};
//!
//! let config = GameConfig {
//!     computer_players: 3,
//!     ..GameConfig::default()
//! };
//! let (game, handle) = Game::with_defaults(config).unwrap();
//! let thread = game.spawn().unwrap();
//! handle.shutdown();
//! println!("{}", thread.join().unwrap());
//! ```

/// Shared board state.
pub mod board;
pub use board::{Board, Hint, RemovedCard, Slot, Toggle};

/// Claim queue between players and the dealer.
pub mod claims;
pub use claims::{Claim, ClaimQueue};

/// Game configuration.
pub mod config;
pub use config::{GameConfig, PlayerId};

pub mod dealer;
pub use dealer::Dealer;

/// Display sinks.
pub mod display;
pub use display::{DisplayEvent, DisplaySink, LogDisplay, NullDisplay, RecordingDisplay};

pub mod errors;
pub use errors::{ConfigError, ConfigResult, GameError, GameResult};

/// Game assembly and results.
pub mod game;
pub use game::{ClaimStats, Game, GameHandle, GameSummary, GameThread, PlayerScore};

/// Player actors.
pub mod player;
pub use player::{Freeze, Player, PlayerHandle, PlayerState};

/// Card encoding and set validity.
pub mod rules;
pub use rules::{Card, FeatureRules, SetRules};
