//! Display sinks for board, score, and timer updates.
//!
//! All calls are fire-and-forget and may come from any game thread, so
//! implementations must be cheap and must never call back into the game.

use crate::{board::Slot, config::PlayerId, rules::Card};
use parking_lot::Mutex;
use std::time::Duration;

/// Receiver of every visible change in the game
pub trait DisplaySink: Send + Sync {
    fn show_card(&self, card: Card, slot: Slot);
    fn hide_card(&self, slot: Slot);
    fn show_marker(&self, player: PlayerId, slot: Slot);
    fn hide_marker(&self, player: PlayerId, slot: Slot);
    fn show_score(&self, player: PlayerId, score: u32);
    fn show_countdown(&self, remaining: Duration, urgent: bool);
    fn show_freeze(&self, player: PlayerId, remaining: Duration);
    fn announce_winners(&self, winners: &[PlayerId]);
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show_card(&self, _card: Card, _slot: Slot) {}
    fn hide_card(&self, _slot: Slot) {}
    fn show_marker(&self, _player: PlayerId, _slot: Slot) {}
    fn hide_marker(&self, _player: PlayerId, _slot: Slot) {}
    fn show_score(&self, _player: PlayerId, _score: u32) {}
    fn show_countdown(&self, _remaining: Duration, _urgent: bool) {}
    fn show_freeze(&self, _player: PlayerId, _remaining: Duration) {}
    fn announce_winners(&self, _winners: &[PlayerId]) {}
}

/// Renders events as log lines
#[derive(Debug, Clone)]
pub struct LogDisplay {
    names: Vec<String>,
}

impl LogDisplay {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    fn name(&self, player: PlayerId) -> &str {
        self.names.get(player).map_or("unknown", String::as_str)
    }
}

impl DisplaySink for LogDisplay {
    fn show_card(&self, card: Card, slot: Slot) {
        log::debug!("Card {card} placed in slot {slot}");
    }

    fn hide_card(&self, slot: Slot) {
        log::debug!("Slot {slot} cleared");
    }

    fn show_marker(&self, player: PlayerId, slot: Slot) {
        log::trace!("{} marked slot {slot}", self.name(player));
    }

    fn hide_marker(&self, player: PlayerId, slot: Slot) {
        log::trace!("{} unmarked slot {slot}", self.name(player));
    }

    fn show_score(&self, player: PlayerId, score: u32) {
        log::info!("{} has {score} point(s)", self.name(player));
    }

    fn show_countdown(&self, remaining: Duration, urgent: bool) {
        if urgent {
            log::trace!("Countdown {:.1}s (hurry)", remaining.as_secs_f32());
        } else {
            log::trace!("Countdown {}s", remaining.as_secs());
        }
    }

    fn show_freeze(&self, player: PlayerId, remaining: Duration) {
        log::trace!("{} frozen for {}s", self.name(player), remaining.as_secs());
    }

    fn announce_winners(&self, winners: &[PlayerId]) {
        let names: Vec<&str> = winners.iter().map(|&p| self.name(p)).collect();
        match names.as_slice() {
            [single] => log::info!("The winner is {single}"),
            _ => log::info!("It is a draw between {}", names.join(", ")),
        }
    }
}

/// One recorded display call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    ShowCard { card: Card, slot: Slot },
    HideCard { slot: Slot },
    ShowMarker { player: PlayerId, slot: Slot },
    HideMarker { player: PlayerId, slot: Slot },
    Score { player: PlayerId, score: u32 },
    Countdown { remaining: Duration, urgent: bool },
    Freeze { player: PlayerId, remaining: Duration },
    Winners(Vec<PlayerId>),
}

/// Keeps every event in arrival order; used to observe a running game
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// Events matching a predicate
    pub fn filter(&self, pred: impl Fn(&DisplayEvent) -> bool) -> Vec<DisplayEvent> {
        self.events.lock().iter().filter(|e| pred(e)).cloned().collect()
    }

    pub fn winners(&self) -> Option<Vec<PlayerId>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            DisplayEvent::Winners(w) => Some(w.clone()),
            _ => None,
        })
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}

impl DisplaySink for RecordingDisplay {
    fn show_card(&self, card: Card, slot: Slot) {
        self.push(DisplayEvent::ShowCard { card, slot });
    }

    fn hide_card(&self, slot: Slot) {
        self.push(DisplayEvent::HideCard { slot });
    }

    fn show_marker(&self, player: PlayerId, slot: Slot) {
        self.push(DisplayEvent::ShowMarker { player, slot });
    }

    fn hide_marker(&self, player: PlayerId, slot: Slot) {
        self.push(DisplayEvent::HideMarker { player, slot });
    }

    fn show_score(&self, player: PlayerId, score: u32) {
        self.push(DisplayEvent::Score { player, score });
    }

    fn show_countdown(&self, remaining: Duration, urgent: bool) {
        self.push(DisplayEvent::Countdown { remaining, urgent });
    }

    fn show_freeze(&self, player: PlayerId, remaining: Duration) {
        self.push(DisplayEvent::Freeze { player, remaining });
    }

    fn announce_winners(&self, winners: &[PlayerId]) {
        self.push(DisplayEvent::Winners(winners.to_vec()));
    }
}
