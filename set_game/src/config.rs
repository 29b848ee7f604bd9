//! Game configuration models.

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player identifier; also the index into the player list
pub type PlayerId = usize;

/// Game configuration, read once before the dealer starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of human players (ids `0..human_players`)
    pub human_players: usize,

    /// Number of computer players (ids after the humans)
    pub computer_players: usize,

    /// Display names, one per player (empty means generated names)
    pub player_names: Vec<String>,

    /// Number of slots on the board (default: 12)
    pub board_size: usize,

    /// Cards per set, and values per feature (default: 3)
    pub set_size: usize,

    /// Features per card (default: 4)
    pub feature_count: usize,

    /// Distinct cards in the deck, `set_size ^ feature_count` (default: 81)
    pub deck_size: usize,

    /// Time before the board is reshuffled
    pub turn_timeout_ms: u64,

    /// Remaining time below which the countdown is shown as urgent
    pub turn_timeout_warning_ms: u64,

    /// Freeze after a correct claim
    pub point_freeze_ms: u64,

    /// Freeze after a wrong claim
    pub penalty_freeze_ms: u64,

    /// Artificial delay when placing or removing a card
    pub table_delay_ms: u64,

    /// Delay between two computer key presses
    pub computer_delay_ms: u64,

    /// Log every legal set on the board after each deal
    pub hints: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            human_players: 0,
            computer_players: 2,
            player_names: Vec::new(),
            board_size: 12,
            set_size: 3,
            feature_count: 4,
            deck_size: 81,
            turn_timeout_ms: 60_000,
            turn_timeout_warning_ms: 5_000,
            point_freeze_ms: 1_000,
            penalty_freeze_ms: 3_000,
            table_delay_ms: 100,
            computer_delay_ms: 10,
            hints: false,
        }
    }
}

impl GameConfig {
    /// Load configuration from `SET_*` environment variables over the defaults
    ///
    /// Values that fail to parse keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let player_names = std::env::var("SET_PLAYER_NAMES")
            .map(|names| {
                names
                    .split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            human_players: parse_env_or("SET_HUMAN_PLAYERS", defaults.human_players),
            computer_players: parse_env_or("SET_COMPUTER_PLAYERS", defaults.computer_players),
            player_names,
            board_size: parse_env_or("SET_BOARD_SIZE", defaults.board_size),
            set_size: parse_env_or("SET_SET_SIZE", defaults.set_size),
            feature_count: parse_env_or("SET_FEATURE_COUNT", defaults.feature_count),
            deck_size: parse_env_or("SET_DECK_SIZE", defaults.deck_size),
            turn_timeout_ms: parse_env_or("SET_TURN_TIMEOUT_MS", defaults.turn_timeout_ms),
            turn_timeout_warning_ms: parse_env_or(
                "SET_TURN_TIMEOUT_WARNING_MS",
                defaults.turn_timeout_warning_ms,
            ),
            point_freeze_ms: parse_env_or("SET_POINT_FREEZE_MS", defaults.point_freeze_ms),
            penalty_freeze_ms: parse_env_or("SET_PENALTY_FREEZE_MS", defaults.penalty_freeze_ms),
            table_delay_ms: parse_env_or("SET_TABLE_DELAY_MS", defaults.table_delay_ms),
            computer_delay_ms: parse_env_or("SET_COMPUTER_DELAY_MS", defaults.computer_delay_ms),
            hints: parse_env_or("SET_HINTS", defaults.hints),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.players() == 0 {
            return Err(ConfigError::NoPlayers);
        }

        if self.set_size < 2 {
            return Err(ConfigError::SetSizeTooSmall(self.set_size));
        }

        if self.board_size < self.set_size {
            return Err(ConfigError::BoardTooSmall {
                board_size: self.board_size,
                set_size: self.set_size,
            });
        }

        let expected = u32::try_from(self.feature_count)
            .ok()
            .and_then(|exp| self.set_size.checked_pow(exp));
        if expected != Some(self.deck_size) {
            return Err(ConfigError::DeckSizeMismatch {
                actual: self.deck_size,
                expected: expected.unwrap_or(usize::MAX),
                set_size: self.set_size,
                feature_count: self.feature_count,
            });
        }

        if self.turn_timeout_ms == 0 {
            return Err(ConfigError::ZeroTurnTimeout);
        }

        if self.turn_timeout_warning_ms > self.turn_timeout_ms {
            return Err(ConfigError::WarningExceedsTurn {
                warning_ms: self.turn_timeout_warning_ms,
                timeout_ms: self.turn_timeout_ms,
            });
        }

        if self.computer_players > 0 && self.computer_delay_ms == 0 {
            return Err(ConfigError::ZeroComputerDelay);
        }

        if !self.player_names.is_empty() && self.player_names.len() != self.players() {
            return Err(ConfigError::PlayerNamesMismatch {
                expected: self.players(),
                actual: self.player_names.len(),
            });
        }

        Ok(())
    }

    /// Total number of players
    pub fn players(&self) -> usize {
        self.human_players + self.computer_players
    }

    /// Humans take the lowest ids
    pub fn is_human(&self, player: PlayerId) -> bool {
        player < self.human_players
    }

    /// Display name for a player
    pub fn player_name(&self, player: PlayerId) -> String {
        if let Some(name) = self.player_names.get(player) {
            return name.clone();
        }
        if self.is_human(player) {
            format!("Player {}", player + 1)
        } else {
            format!("Computer {}", player - self.human_players + 1)
        }
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn turn_timeout_warning(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_warning_ms)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_ms)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_ms)
    }

    pub fn table_delay(&self) -> Duration {
        Duration::from_millis(self.table_delay_ms)
    }

    pub fn computer_delay(&self) -> Duration {
        Duration::from_millis(self.computer_delay_ms)
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid value for {key}: {value}");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.deck_size, 81);
        assert_eq!(config.players(), 2);
    }

    #[test]
    fn test_config_validation_no_players() {
        let config = GameConfig {
            computer_players: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPlayers));
    }

    #[test]
    fn test_config_validation_board_too_small() {
        let config = GameConfig {
            board_size: 2,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BoardTooSmall { .. })
        ));
    }

    #[test]
    fn test_config_validation_deck_mismatch() {
        let config = GameConfig {
            deck_size: 80,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("80"));
        assert!(err.to_string().contains("81"));
    }

    #[test]
    fn test_config_validation_warning_exceeds_turn() {
        let config = GameConfig {
            turn_timeout_ms: 1_000,
            turn_timeout_warning_ms: 2_000,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WarningExceedsTurn { .. })
        ));
    }

    #[test]
    fn test_config_validation_zero_computer_delay() {
        let config = GameConfig {
            computer_delay_ms: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroComputerDelay));

        let humans_only = GameConfig {
            human_players: 1,
            computer_players: 0,
            ..config
        };
        assert_eq!(humans_only.validate(), Ok(()));
    }

    #[test]
    fn test_config_validation_names_mismatch() {
        let config = GameConfig {
            player_names: vec!["alice".to_string()],
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PlayerNamesMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_player_names() {
        let config = GameConfig {
            human_players: 1,
            computer_players: 2,
            ..GameConfig::default()
        };
        assert!(config.is_human(0));
        assert!(!config.is_human(1));
        assert_eq!(config.player_name(0), "Player 1");
        assert_eq!(config.player_name(2), "Computer 2");

        let named = GameConfig {
            player_names: vec!["a".into(), "b".into(), "c".into()],
            ..config
        };
        assert_eq!(named.player_name(1), "b");
    }

    #[test]
    fn test_durations() {
        let config = GameConfig::default();
        assert_eq!(config.turn_timeout(), Duration::from_secs(60));
        assert_eq!(config.penalty_freeze(), Duration::from_secs(3));
        assert_eq!(config.computer_delay(), Duration::from_millis(10));
    }
}
