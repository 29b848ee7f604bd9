//! FIFO of claim signals between players and the dealer.
//!
//! Any number of players submit, only the dealer consumes. While the dealer
//! holds a [`Processing`] guard no claim is handed out, and computer players
//! stop generating input.

use crate::config::PlayerId;
use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// A player's assertion that their markers form a set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub player: PlayerId,
    pub submitted_at: Instant,
}

#[derive(Debug, Default)]
struct ClaimState {
    pending: VecDeque<Claim>,
    processing: bool,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct ClaimQueue {
    state: Mutex<ClaimState>,
    ready: Condvar,
}

impl ClaimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a claim and wake the dealer
    pub fn submit(&self, player: PlayerId) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.pending.push_back(Claim {
            player,
            submitted_at: Instant::now(),
        });
        self.ready.notify_one();
    }

    /// Wait up to `timeout` for the oldest claim
    ///
    /// Returns `None` on timeout, while a [`Processing`] guard is held, or
    /// once the queue is closed.
    pub fn await_one(&self, timeout: Duration) -> Option<Claim> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if !state.processing
                && let Some(claim) = state.pending.pop_front()
            {
                return Some(claim);
            }
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return None;
            }
        }
    }

    /// Mark the dealer busy until the guard drops
    pub fn hold(&self) -> Processing<'_> {
        self.state.lock().processing = true;
        Processing { queue: self }
    }

    /// True while the dealer is judging a claim or dealing
    pub fn is_processing(&self) -> bool {
        self.state.lock().processing
    }

    /// Drop every pending claim
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse further claims and wake every waiter
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.pending.clear();
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Guard returned by [`ClaimQueue::hold`]
#[must_use]
pub struct Processing<'a> {
    queue: &'a ClaimQueue,
}

impl Drop for Processing<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.state.lock();
        state.processing = false;
        self.queue.ready.notify_all();
    }
}
