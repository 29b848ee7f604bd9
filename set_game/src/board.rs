//! The shared board: slot↔card mapping plus per-slot player markers.
//!
//! ## Locking
//!
//! Every slot has its own mutex, so marker toggles on different slots run in
//! parallel. A reader/writer `gate` sits above them: per-slot operations hold
//! it shared, whole-board operations (resets, marker snapshots) hold it
//! exclusively. Lock order is always `gate` → slot → card index.
//!
//! Per-player marker counts live next to the markers and are only changed
//! while the slot holding the marker is locked, so a count can never disagree
//! with the markers for longer than one slot operation.

use crate::{
    config::{GameConfig, PlayerId},
    display::DisplaySink,
    rules::{Card, SetRules},
};
use parking_lot::{Mutex, RwLock};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

/// Board position, `0..board_size`
pub type Slot = usize;

/// Outcome of [`Board::toggle_marker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Marker placed
    Added,
    /// Existing marker taken back
    Removed,
    /// No marker and the caller may not add one
    Full,
    /// Slot holds no card
    Rejected,
}

/// A card taken off the board together with the players whose markers went
/// with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedCard {
    pub card: Card,
    pub slot: Slot,
    pub displaced: Vec<PlayerId>,
}

/// A legal set currently on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub slots: Vec<Slot>,
    pub cards: Vec<Card>,
}

#[derive(Debug, Default)]
struct SlotState {
    card: Option<Card>,
    markers: Vec<PlayerId>,
}

pub struct Board {
    gate: RwLock<()>,
    slots: Vec<Mutex<SlotState>>,
    card_slots: Mutex<Vec<Option<Slot>>>,
    marker_counts: Vec<AtomicUsize>,
    set_size: usize,
    delay: Duration,
    display: Arc<dyn DisplaySink>,
}

impl Board {
    pub fn new(config: &GameConfig, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            gate: RwLock::new(()),
            slots: (0..config.board_size)
                .map(|_| Mutex::new(SlotState::default()))
                .collect(),
            card_slots: Mutex::new(vec![None; config.deck_size]),
            marker_counts: (0..config.players()).map(|_| AtomicUsize::new(0)).collect(),
            set_size: config.set_size,
            delay: config.table_delay(),
            display,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn set_size(&self) -> usize {
        self.set_size
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    // === Cards ===

    /// Put `card` into the empty `slot`
    ///
    /// # Panics
    ///
    /// If the slot is occupied or the card is already on the board.
    pub fn place_card(&self, card: Card, slot: Slot) {
        self.pause();

        let _gate = self.gate.read();
        let mut state = self.slots[slot].lock();
        assert!(
            state.card.is_none(),
            "slot {slot} already holds card {:?}",
            state.card
        );
        {
            let mut card_slots = self.card_slots.lock();
            assert!(
                card_slots[card].is_none(),
                "card {card} is already on the board"
            );
            card_slots[card] = Some(slot);
        }
        state.card = Some(card);
        self.display.show_card(card, slot);
    }

    /// Take the card out of `slot`, dropping every marker on it first
    ///
    /// Returns `None` if the slot was already empty.
    pub fn remove_card(&self, slot: Slot) -> Option<RemovedCard> {
        let _gate = self.gate.read();
        let mut state = self.slots[slot].lock();
        let card = state.card?;
        self.pause();

        let displaced = self.drain_markers(slot, &mut state);
        state.card = None;
        self.card_slots.lock()[card] = None;
        self.display.hide_card(slot);

        Some(RemovedCard {
            card,
            slot,
            displaced,
        })
    }

    /// Remove every given card that is still on the board
    pub fn remove_cards(&self, cards: &[Card]) -> Vec<RemovedCard> {
        cards
            .iter()
            .filter_map(|&card| self.slot_of(card))
            .filter_map(|slot| self.remove_card(slot))
            .collect()
    }

    pub fn card_at(&self, slot: Slot) -> Option<Card> {
        let _gate = self.gate.read();
        self.slots[slot].lock().card
    }

    pub fn slot_of(&self, card: Card) -> Option<Slot> {
        self.card_slots.lock()[card]
    }

    pub fn is_slot_empty(&self, slot: Slot) -> bool {
        self.card_at(slot).is_none()
    }

    /// Cards on the board in slot order
    pub fn cards(&self) -> Vec<Card> {
        self.snapshot().into_iter().flatten().collect()
    }

    pub fn count_cards(&self) -> usize {
        self.snapshot().iter().flatten().count()
    }

    pub fn empty_slots(&self) -> Vec<Slot> {
        self.snapshot()
            .iter()
            .enumerate()
            .filter_map(|(slot, card)| card.is_none().then_some(slot))
            .collect()
    }

    /// Consistent view of every slot
    pub fn snapshot(&self) -> Vec<Option<Card>> {
        let _gate = self.gate.write();
        self.slots.iter().map(|slot| slot.lock().card).collect()
    }

    /// Every legal set on the board
    pub fn hints(&self, rules: &dyn SetRules) -> Vec<Hint> {
        rules
            .find_sets(&self.cards(), usize::MAX)
            .into_iter()
            .map(|cards| {
                let mut slots: Vec<Slot> =
                    cards.iter().filter_map(|&card| self.slot_of(card)).collect();
                slots.sort_unstable();
                Hint { slots, cards }
            })
            .collect()
    }

    // === Markers ===

    /// Flip `player`'s marker on `slot`
    ///
    /// Taking a marker back is always allowed; placing one needs an occupied
    /// slot and `may_add`.
    pub fn toggle_marker(&self, player: PlayerId, slot: Slot, may_add: bool) -> Toggle {
        let _gate = self.gate.read();
        let mut state = self.slots[slot].lock();

        if state.card.is_none() {
            return Toggle::Rejected;
        }

        if let Some(idx) = state.markers.iter().position(|&p| p == player) {
            state.markers.remove(idx);
            self.marker_counts[player].fetch_sub(1, Ordering::AcqRel);
            self.display.hide_marker(player, slot);
            return Toggle::Removed;
        }

        if !may_add {
            return Toggle::Full;
        }

        state.markers.push(player);
        self.marker_counts[player].fetch_add(1, Ordering::AcqRel);
        self.display.show_marker(player, slot);
        Toggle::Added
    }

    /// Number of markers `player` has on the board
    pub fn marker_count(&self, player: PlayerId) -> usize {
        self.marker_counts[player].load(Ordering::Acquire)
    }

    /// Cards under `player`'s markers, in slot order, at most `set_size`
    ///
    /// A result shorter than `set_size` means the player no longer holds a
    /// full selection.
    pub fn markers_of(&self, player: PlayerId) -> Vec<Card> {
        let _gate = self.gate.write();
        self.slots
            .iter()
            .filter_map(|slot| {
                let state = slot.lock();
                state
                    .markers
                    .contains(&player)
                    .then_some(state.card)
                    .flatten()
            })
            .take(self.set_size)
            .collect()
    }

    /// Players with a marker on `slot`
    pub fn markers_at(&self, slot: Slot) -> Vec<PlayerId> {
        let _gate = self.gate.read();
        self.slots[slot].lock().markers.clone()
    }

    /// Take back every marker `player` holds
    pub fn clear_markers_of(&self, player: PlayerId) {
        let _gate = self.gate.read();
        for (slot, state) in self.slots.iter().enumerate() {
            let mut state = state.lock();
            if let Some(idx) = state.markers.iter().position(|&p| p == player) {
                state.markers.remove(idx);
                self.marker_counts[player].fetch_sub(1, Ordering::AcqRel);
                self.display.hide_marker(player, slot);
            }
        }
    }

    /// Drop every marker on the board
    pub fn clear_all_markers(&self) {
        let _gate = self.gate.write();
        for (slot, state) in self.slots.iter().enumerate() {
            let mut state = state.lock();
            self.drain_markers(slot, &mut state);
        }
    }

    /// Drop every marker and return every card to the caller, in slot order
    pub fn clear_all(&self) -> Vec<Card> {
        let _gate = self.gate.write();
        let mut cards = Vec::new();
        for (slot, state) in self.slots.iter().enumerate() {
            let mut state = state.lock();
            self.drain_markers(slot, &mut state);
            if let Some(card) = state.card.take() {
                self.pause();
                self.card_slots.lock()[card] = None;
                self.display.hide_card(slot);
                cards.push(card);
            }
        }
        cards
    }

    /// Caller holds the slot lock
    fn drain_markers(&self, slot: Slot, state: &mut SlotState) -> Vec<PlayerId> {
        let displaced = std::mem::take(&mut state.markers);
        for &player in &displaced {
            self.marker_counts[player].fetch_sub(1, Ordering::AcqRel);
            self.display.hide_marker(player, slot);
        }
        displaced
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("slots", &self.snapshot())
            .field("set_size", &self.set_size)
            .finish()
    }
}
