//! Dealer: the single arbiter thread.
//!
//! The dealer owns the deck, deals onto the shared board, runs the round
//! countdown, and is the only thread that judges claims or takes cards off
//! the board. One claim is judged per wake, in submission order.

use crate::{
    board::Board,
    claims::{Claim, ClaimQueue},
    config::{GameConfig, PlayerId},
    display::DisplaySink,
    errors::{GameError, GameResult},
    game::{ClaimStats, GameSummary, PlayerScore},
    player::{Player, PlayerHandle, join_named},
    rules::{Card, SetRules},
};
use rand::seq::SliceRandom;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Claim wait while the countdown is relaxed
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Claim wait once the countdown is urgent
const URGENT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct Dealer {
    config: GameConfig,
    board: Arc<Board>,
    claims: Arc<ClaimQueue>,
    players: Vec<PlayerHandle>,
    deck: Vec<Card>,
    rules: Arc<dyn SetRules>,
    display: Arc<dyn DisplaySink>,
    shutdown: Arc<AtomicBool>,
    deadline: Instant,
    rounds: u32,
    stats: ClaimStats,
}

impl Dealer {
    /// Create a dealer with a full deck
    pub fn new(
        config: GameConfig,
        board: Arc<Board>,
        claims: Arc<ClaimQueue>,
        players: Vec<PlayerHandle>,
        rules: Arc<dyn SetRules>,
        display: Arc<dyn DisplaySink>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let deck = (0..config.deck_size).collect();
        let deadline = Instant::now() + config.turn_timeout();
        Self {
            config,
            board,
            claims,
            players,
            deck,
            rules,
            display,
            shutdown,
            deadline,
            rounds: 0,
            stats: ClaimStats::default(),
        }
    }

    /// Replace the undealt cards
    pub fn set_deck(&mut self, deck: Vec<Card>) {
        self.deck = deck;
    }

    /// Start every player, play rounds until no set is left or shutdown is
    /// requested, then announce winners and stop the players
    pub fn run(mut self, actors: Vec<Player>) -> GameResult<GameSummary> {
        log::info!("Thread dealer starting");

        let threads = self.spawn_players(actors)?;

        while !self.should_finish() {
            self.rounds += 1;
            log::info!("Round {} starting, {} card(s) in deck", self.rounds, self.deck.len());
            {
                let claims = Arc::clone(&self.claims);
                let _hold = claims.hold();
                self.place_cards();
            }
            self.timer_loop();
            self.update_countdown(true);
            self.remove_all_cards();
            log::debug!("Round {} over, board returned to the deck", self.rounds);
        }

        let winners = self.announce_winners();
        let joined = self.stop_players(threads);

        log::info!("Thread dealer terminated");
        joined?;
        Ok(self.summary(winners))
    }

    /// Start one thread per player; on failure the ones already running are
    /// stopped and joined
    fn spawn_players(&self, actors: Vec<Player>) -> GameResult<Vec<JoinHandle<GameResult<()>>>> {
        let mut threads = Vec::with_capacity(actors.len());
        for (actor, handle) in actors.into_iter().zip(&self.players) {
            let name = format!("player-{}", handle.id());
            match thread::Builder::new()
                .name(name.clone())
                .spawn(move || actor.run())
            {
                Ok(thread) => threads.push(thread),
                Err(source) => {
                    if let Err(err) = self.stop_players(threads) {
                        log::warn!("Cleanup after failed spawn of {name}: {err}");
                    }
                    return Err(GameError::Spawn { name, source });
                }
            }
        }
        Ok(threads)
    }

    /// Terminate every player, then join `threads` newest first
    ///
    /// Every thread is joined even if an earlier one panicked; the first
    /// failure is returned.
    fn stop_players(&self, threads: Vec<JoinHandle<GameResult<()>>>) -> GameResult<()> {
        let order = self.terminate();
        log::debug!("Terminated players in order {order:?}");
        threads
            .into_iter()
            .rev()
            .map(|handle| join_named(handle).and_then(|result| result))
            .fold(Ok(()), |acc: GameResult<()>, result| acc.and(result))
    }

    /// True once shutdown was requested from outside
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn should_finish(&self) -> bool {
        if self.is_shutdown() {
            return true;
        }
        let mut remaining = self.deck.clone();
        remaining.extend(self.board.cards());
        self.rules.find_sets(&remaining, 1).is_empty()
    }

    /// Wait for claims until the countdown runs out
    fn timer_loop(&mut self) {
        self.update_countdown(true);

        while !self.is_shutdown() {
            let remaining = self.remaining();
            if remaining.is_zero() {
                break;
            }
            let poll = if remaining > self.config.turn_timeout_warning() {
                POLL_INTERVAL
            } else {
                URGENT_POLL_INTERVAL
            };

            if let Some(claim) = self.claims.await_one(poll.min(remaining)) {
                let claims = Arc::clone(&self.claims);
                let _hold = claims.hold();
                self.judge(claim);
                self.place_cards();
            }
            self.update_countdown(false);

            if self.deck.is_empty() && self.rules.find_sets(&self.board.cards(), 1).is_empty() {
                log::info!("No set left on the board and the deck is empty");
                break;
            }
        }
    }

    /// Validate one claim against the claimant's current markers
    fn judge(&mut self, claim: Claim) {
        let player = &self.players[claim.player];
        log::debug!(
            "Judging claim from {}, {} more pending",
            player.name(),
            self.claims.len()
        );
        if player.is_frozen() || player.is_terminated() {
            log::debug!("Ignoring claim from {} while frozen", player.name());
            self.stats.stale += 1;
            return;
        }

        let cards = self.board.markers_of(claim.player);
        if cards.len() < self.config.set_size {
            log::debug!(
                "Ignoring stale claim from {} ({} of {} markers left)",
                player.name(),
                cards.len(),
                self.config.set_size
            );
            player.dismiss();
            self.stats.stale += 1;
            return;
        }

        if self.rules.is_set(&cards) {
            log::info!(
                "{} found a set {:?} after {:?}",
                player.name(),
                cards,
                claim.submitted_at.elapsed()
            );
            player.reward();
            for removed in self.board.remove_cards(&cards) {
                for other in removed.displaced.iter().filter(|&&p| p != claim.player) {
                    let other = &self.players[*other];
                    log::debug!("{} lost marker on slot {}", other.name(), removed.slot);
                    other.dismiss();
                }
            }
            self.update_countdown(true);
            self.stats.valid += 1;
        } else {
            log::info!("{} claimed {:?}, not a set", player.name(), cards);
            player.penalize();
            self.stats.invalid += 1;
        }
    }

    /// Fill empty slots from the shuffled deck while it lasts
    fn place_cards(&mut self) -> usize {
        let empty = self.board.empty_slots();
        if empty.is_empty() || self.deck.is_empty() {
            return 0;
        }

        self.deck.shuffle(&mut rand::rng());
        let mut placed = 0;
        for slot in empty {
            let Some(card) = self.deck.pop() else {
                break;
            };
            self.board.place_card(card, slot);
            placed += 1;
        }

        if self.config.hints {
            self.log_hints();
        }
        placed
    }

    fn log_hints(&self) {
        for hint in self.board.hints(self.rules.as_ref()) {
            let features: Vec<Vec<usize>> =
                hint.cards.iter().map(|&card| self.rules.features(card)).collect();
            log::info!("Hint: set found: slots {:?} features {:?}", hint.slots, features);
        }
    }

    /// Return every card to the deck and forget all markers and claims
    fn remove_all_cards(&mut self) {
        let _hold = self.claims.hold();
        let dropped = self.claims.clear();
        if dropped > 0 {
            log::debug!("Dropped {dropped} pending claim(s) at round end");
        }
        self.board.clear_all_markers();
        for player in &self.players {
            player.reset();
        }
        let returned = self.board.clear_all();
        self.deck.extend(returned);
    }

    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Refresh the countdown display; `reset` restarts the round timer
    fn update_countdown(&mut self, reset: bool) {
        if reset {
            self.deadline = Instant::now() + self.config.turn_timeout();
        }
        let remaining = self.remaining();
        self.display
            .show_countdown(remaining, remaining <= self.config.turn_timeout_warning());
    }

    /// Every player holding the top score
    fn announce_winners(&self) -> Vec<PlayerId> {
        let best = self.players.iter().map(PlayerHandle::score).max().unwrap_or(0);
        let winners: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|player| player.score() == best)
            .map(PlayerHandle::id)
            .collect();
        log::info!("Game over after {} round(s), winners {:?}", self.rounds, winners);
        self.display.announce_winners(&winners);
        winners
    }

    /// Stop players in reverse order of creation; returns that order
    fn terminate(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .rev()
            .map(|player| {
                player.terminate();
                player.id()
            })
            .collect()
    }

    fn summary(&self, winners: Vec<PlayerId>) -> GameSummary {
        GameSummary {
            scores: self
                .players
                .iter()
                .map(|player| PlayerScore {
                    id: player.id(),
                    name: player.name().to_string(),
                    score: player.score(),
                })
                .collect(),
            winners,
            rounds: self.rounds,
            claims: self.stats,
            cards_left: self.deck.len() + self.board.count_cards(),
        }
    }
}
