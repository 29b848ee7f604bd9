//! Game assembly: wires the board, claim queue, players and dealer together
//! and exposes a handle for input sources and shutdown.

use crate::{
    board::{Board, Slot},
    claims::ClaimQueue,
    config::{GameConfig, PlayerId},
    dealer::Dealer,
    display::{DisplaySink, LogDisplay},
    errors::{GameError, GameResult},
    player::{Player, PlayerHandle, join_named},
    rules::{Card, FeatureRules, SetRules},
};
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

/// Final score of one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerScore {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// How the dealer ruled on claims over a whole game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClaimStats {
    pub valid: u32,
    pub invalid: u32,
    /// Claims whose markers were gone by the time they were judged
    pub stale: u32,
}

/// Outcome of a finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub scores: Vec<PlayerScore>,
    pub winners: Vec<PlayerId>,
    pub rounds: u32,
    pub claims: ClaimStats,
    pub cards_left: usize,
}

impl GameSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn score_of(&self, player: PlayerId) -> Option<u32> {
        self.scores.iter().find(|s| s.id == player).map(|s| s.score)
    }
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rounds played: {}", self.rounds)?;
        for entry in &self.scores {
            let marker = if self.winners.contains(&entry.id) { " *" } else { "" };
            writeln!(f, "  {:<12} {:>3}{marker}", entry.name, entry.score)?;
        }
        write!(
            f,
            "Claims: {} valid, {} invalid, {} stale",
            self.claims.valid, self.claims.invalid, self.claims.stale
        )
    }
}

/// A game ready to run
pub struct Game {
    dealer: Dealer,
    actors: Vec<Player>,
}

/// Cloneable access to a running game
#[derive(Clone, Debug)]
pub struct GameHandle {
    players: Vec<PlayerHandle>,
    board: Arc<Board>,
    claims: Arc<ClaimQueue>,
    shutdown: Arc<AtomicBool>,
}

impl Game {
    /// Validate `config` and build every component
    pub fn new(
        config: GameConfig,
        rules: Arc<dyn SetRules>,
        display: Arc<dyn DisplaySink>,
    ) -> GameResult<(Self, GameHandle)> {
        config.validate()?;

        let board = Arc::new(Board::new(&config, display.clone()));
        let claims = Arc::new(ClaimQueue::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let (actors, players): (Vec<Player>, Vec<PlayerHandle>) = (0..config.players())
            .map(|id| Player::new(id, &config, board.clone(), claims.clone(), display.clone()))
            .unzip();

        log::info!(
            "Created game with {} human and {} computer player(s)",
            config.human_players,
            config.computer_players
        );

        let dealer = Dealer::new(
            config,
            board.clone(),
            claims.clone(),
            players.clone(),
            rules,
            display,
            shutdown.clone(),
        );

        let handle = GameHandle {
            players,
            board,
            claims,
            shutdown,
        };
        Ok((Self { dealer, actors }, handle))
    }

    /// Standard feature rules with log output
    pub fn with_defaults(config: GameConfig) -> GameResult<(Self, GameHandle)> {
        let rules = Arc::new(FeatureRules::new(config.set_size, config.feature_count));
        let names = (0..config.players()).map(|id| config.player_name(id)).collect();
        Self::new(config, rules, Arc::new(LogDisplay::new(names)))
    }

    /// Start from a fixed set of undealt cards instead of the full deck
    pub fn with_deck(mut self, deck: Vec<Card>) -> Self {
        self.dealer.set_deck(deck);
        self
    }

    /// Play on the calling thread until the game ends
    pub fn run(self) -> GameResult<GameSummary> {
        self.dealer.run(self.actors)
    }

    /// Play on a dedicated `dealer` thread
    pub fn spawn(self) -> GameResult<GameThread> {
        let name = "dealer".to_string();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())
            .map(GameThread)
            .map_err(|source| GameError::Spawn { name, source })
    }
}

/// Join handle of a spawned game
pub struct GameThread(JoinHandle<GameResult<GameSummary>>);

impl GameThread {
    pub fn join(self) -> GameResult<GameSummary> {
        join_named(self.0)?
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl GameHandle {
    /// Route a human key press; false if the press was dropped
    pub fn press(&self, player: PlayerId, slot: Slot) -> bool {
        slot < self.board.size()
            && self
                .players
                .get(player)
                .is_some_and(|handle| handle.submit_input(slot))
    }

    /// Ask the dealer to wrap up; winners are still announced
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            log::info!("Shutdown requested");
        }
        self.claims.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn players(&self) -> &[PlayerHandle] {
        &self.players
    }

    pub fn player(&self, player: PlayerId) -> Option<&PlayerHandle> {
        self.players.get(player)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(PlayerHandle::score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::NullDisplay, errors::ConfigError};

    fn config() -> GameConfig {
        GameConfig {
            human_players: 2,
            computer_players: 0,
            table_delay_ms: 0,
            ..GameConfig::default()
        }
    }

    fn build(config: GameConfig) -> GameResult<(Game, GameHandle)> {
        Game::new(config, Arc::new(FeatureRules::new(3, 4)), Arc::new(NullDisplay))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = GameConfig {
            human_players: 0,
            computer_players: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            build(config),
            Err(GameError::Config(ConfigError::NoPlayers))
        ));
    }

    #[test]
    fn test_handle_lists_players() {
        let (_game, handle) = build(config()).unwrap();
        assert_eq!(handle.players().len(), 2);
        assert_eq!(handle.scores(), vec![0, 0]);
        assert!(handle.player(2).is_none());
    }

    #[test]
    fn test_press_validates_target() {
        let (_game, handle) = build(config()).unwrap();
        assert!(handle.press(0, 3));
        assert!(!handle.press(0, 12));
        assert!(!handle.press(9, 0));
    }

    #[test]
    fn test_shutdown_before_start_ends_game() {
        let (game, handle) = build(config()).unwrap();
        handle.shutdown();
        let summary = game.run().unwrap();
        assert_eq!(summary.rounds, 0);
        assert_eq!(summary.winners, vec![0, 1]);
        assert!(handle.players().iter().all(PlayerHandle::is_terminated));
    }

    #[test]
    fn test_deck_without_sets_ends_immediately() {
        let (game, _handle) = build(config()).unwrap();
        let summary = game.with_deck(vec![0, 1, 3, 4]).run().unwrap();
        assert_eq!(summary.rounds, 0);
        assert_eq!(summary.cards_left, 4);
        assert_eq!(summary.winners, vec![0, 1]);
    }

    #[test]
    fn test_summary_text_and_json() {
        let summary = GameSummary {
            scores: vec![
                PlayerScore {
                    id: 0,
                    name: "Player 1".to_string(),
                    score: 2,
                },
                PlayerScore {
                    id: 1,
                    name: "Computer 1".to_string(),
                    score: 1,
                },
            ],
            winners: vec![0],
            rounds: 1,
            claims: ClaimStats {
                valid: 3,
                invalid: 1,
                stale: 0,
            },
            cards_left: 70,
        };
        let text = summary.to_string();
        assert!(text.contains("Player 1"));
        assert!(text.contains("3 valid, 1 invalid"));

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["winners"], serde_json::json!([0]));
        assert_eq!(json["claims"]["valid"], 3);
        assert_eq!(summary.score_of(1), Some(1));
    }
}
