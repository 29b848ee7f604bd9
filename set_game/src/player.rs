//! Player actor: turns slot presses into markers and claims.
//!
//! Each player runs on its own thread and owns a bounded inbox of slot
//! presses. Human presses arrive through [`PlayerHandle::submit_input`];
//! computer players get a second thread that feeds random presses into the
//! same inbox. The dealer talks to the actor only through its handle:
//! [`PlayerHandle::reward`], [`PlayerHandle::penalize`],
//! [`PlayerHandle::reset`] and [`PlayerHandle::terminate`].

use crate::{
    board::{Board, Slot, Toggle},
    claims::ClaimQueue,
    config::{GameConfig, PlayerId},
    display::DisplaySink,
    errors::{GameError, GameResult},
};
use crossbeam_channel::{
    Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, select, unbounded,
};
use parking_lot::Mutex;
use rand::Rng;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Freeze displays refresh at this pace
const FREEZE_TICK: Duration = Duration::from_secs(1);

/// Why a player is frozen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freeze {
    Point,
    Penalty,
}

/// Player lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Accepting presses
    Idle,
    /// Claim submitted, verdict pending; presses still accepted
    Awaiting,
    /// Presses dropped until the freeze runs out
    Frozen(Freeze),
    Terminated,
}

#[derive(Debug)]
enum Control {
    Verdict(Freeze),
    Terminate,
}

struct PlayerShared {
    id: PlayerId,
    name: String,
    human: bool,
    state: Mutex<PlayerState>,
    score: AtomicU32,
    terminated: AtomicBool,
    inputs: Sender<Slot>,
    pending: Receiver<Slot>,
    control: Sender<Control>,
    display: Arc<dyn DisplaySink>,
}

impl PlayerShared {
    fn accepting(&self) -> bool {
        matches!(*self.state.lock(), PlayerState::Idle | PlayerState::Awaiting)
    }

    /// Queue a press unless frozen or full
    fn offer(&self, slot: Slot) -> bool {
        self.accepting() && self.inputs.try_send(slot).is_ok()
    }

    /// Drop every queued press
    fn discard_pending(&self) -> usize {
        self.pending.try_iter().count()
    }

    /// Apply `f` to the state unless the player is terminated
    fn transition(&self, f: impl FnOnce(PlayerState) -> PlayerState) -> PlayerState {
        let mut state = self.state.lock();
        if *state != PlayerState::Terminated {
            *state = f(*state);
        }
        *state
    }
}

/// Cheap, cloneable view of a player used by the dealer and by input sources
#[derive(Clone)]
pub struct PlayerHandle {
    shared: Arc<PlayerShared>,
}

impl PlayerHandle {
    pub fn id(&self) -> PlayerId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_human(&self) -> bool {
        self.shared.human
    }

    pub fn score(&self) -> u32 {
        self.shared.score.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PlayerState {
        *self.shared.state.lock()
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state(), PlayerState::Frozen(_))
    }

    /// Human key press; dropped while frozen, when the inbox is full, or for
    /// computer players
    pub fn submit_input(&self, slot: Slot) -> bool {
        self.shared.human && self.shared.offer(slot)
    }

    /// Score one point and freeze; dealer only
    pub fn reward(&self) {
        let score = self.shared.score.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.display.show_score(self.shared.id, score);
        self.freeze(Freeze::Point);
    }

    /// Freeze without scoring; dealer only
    pub fn penalize(&self) {
        self.freeze(Freeze::Penalty);
    }

    fn freeze(&self, kind: Freeze) {
        let state = self.shared.transition(|_| PlayerState::Frozen(kind));
        if state != PlayerState::Terminated {
            let _ = self.shared.control.send(Control::Verdict(kind));
        }
    }

    /// Forget queued presses and any pending claim at a round boundary
    pub fn reset(&self) {
        self.shared.discard_pending();
        self.dismiss();
    }

    /// Drop a pending claim that can no longer be judged
    pub fn dismiss(&self) {
        self.shared.transition(|state| match state {
            PlayerState::Awaiting => PlayerState::Idle,
            other => other,
        });
    }

    /// Stop the actor and its generator from any state
    pub fn terminate(&self) {
        self.shared.terminated.store(true, Ordering::Release);
        *self.shared.state.lock() = PlayerState::Terminated;
        let _ = self.shared.control.send(Control::Terminate);
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("id", &self.shared.id)
            .field("human", &self.shared.human)
            .field("state", &self.state())
            .field("score", &self.score())
            .finish()
    }
}

/// The actor half, moved onto the player's thread
pub struct Player {
    shared: Arc<PlayerShared>,
    inputs: Receiver<Slot>,
    control: Receiver<Control>,
    board: Arc<Board>,
    claims: Arc<ClaimQueue>,
    set_size: usize,
    point_freeze: Duration,
    penalty_freeze: Duration,
    computer_delay: Duration,
}

impl Player {
    /// Create a player actor and its handle
    ///
    /// # Arguments
    ///
    /// * `id` - Player ID, also its index in the dealer's player list
    /// * `config` - Game configuration
    /// * `board` - Shared board
    /// * `claims` - Dealer's claim queue
    /// * `display` - Display sink for scores and freezes
    pub fn new(
        id: PlayerId,
        config: &GameConfig,
        board: Arc<Board>,
        claims: Arc<ClaimQueue>,
        display: Arc<dyn DisplaySink>,
    ) -> (Self, PlayerHandle) {
        let (input_tx, input_rx) = bounded(config.set_size);
        let (control_tx, control_rx) = unbounded();

        let shared = Arc::new(PlayerShared {
            id,
            name: config.player_name(id),
            human: config.is_human(id),
            state: Mutex::new(PlayerState::Idle),
            score: AtomicU32::new(0),
            terminated: AtomicBool::new(false),
            inputs: input_tx,
            pending: input_rx.clone(),
            control: control_tx,
            display,
        });

        let player = Self {
            shared: shared.clone(),
            inputs: input_rx,
            control: control_rx,
            board,
            claims,
            set_size: config.set_size,
            point_freeze: config.point_freeze(),
            penalty_freeze: config.penalty_freeze(),
            computer_delay: config.computer_delay(),
        };

        (player, PlayerHandle { shared })
    }

    /// Run the player event loop until terminated
    pub fn run(self) -> GameResult<()> {
        let name = thread_name(&self.shared);
        log::info!("Thread {name} starting");

        let generator = if self.shared.human {
            None
        } else {
            Some(self.spawn_generator()?)
        };

        loop {
            match self.control.try_recv() {
                Ok(control) => {
                    if !self.handle(control) {
                        break;
                    }
                    continue;
                }
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            let keep_going = select! {
                recv(self.control) -> control => match control {
                    Ok(control) => self.handle(control),
                    Err(_) => false,
                },
                recv(self.inputs) -> slot => {
                    if let Ok(slot) = slot {
                        self.press(slot);
                    }
                    true
                }
            };
            if !keep_going {
                break;
            }
        }

        let result = match generator {
            Some(handle) => join_named(handle),
            None => Ok(()),
        };
        log::info!("Thread {name} terminated");
        result
    }

    /// Returns false once the player must stop
    fn handle(&self, control: Control) -> bool {
        match control {
            Control::Verdict(kind) => self.freeze(kind),
            Control::Terminate => false,
        }
    }

    fn press(&self, slot: Slot) {
        if !self.shared.accepting() {
            return;
        }

        let id = self.shared.id;
        let may_add = self.board.marker_count(id) < self.set_size;
        match self.board.toggle_marker(id, slot, may_add) {
            Toggle::Added => {
                if self.board.marker_count(id) == self.set_size {
                    let state = self.shared.transition(|state| match state {
                        PlayerState::Idle => PlayerState::Awaiting,
                        other => other,
                    });
                    if state == PlayerState::Awaiting {
                        log::debug!("{} claims a set", self.shared.name);
                        self.claims.submit(id);
                    }
                }
            }
            Toggle::Removed => {
                self.shared.transition(|state| match state {
                    PlayerState::Awaiting => PlayerState::Idle,
                    other => other,
                });
            }
            Toggle::Full => {}
            Toggle::Rejected => {
                let dropped = self.shared.discard_pending();
                log::trace!(
                    "{} pressed empty slot {slot}, dropped {dropped} queued press(es)",
                    self.shared.name
                );
            }
        }
    }

    /// Sit out a freeze; returns false if terminated meanwhile
    fn freeze(&self, kind: Freeze) -> bool {
        let id = self.shared.id;
        let duration = match kind {
            Freeze::Point => self.point_freeze,
            Freeze::Penalty => self.penalty_freeze,
        };
        let until = Instant::now() + duration;
        log::debug!("{} frozen ({kind:?}) for {duration:?}", self.shared.name);

        loop {
            let now = Instant::now();
            if now >= until {
                break;
            }
            let remaining = until - now;
            self.shared.display.show_freeze(id, remaining);
            match self.control.recv_timeout(remaining.min(FREEZE_TICK)) {
                Ok(Control::Terminate) | Err(RecvTimeoutError::Disconnected) => return false,
                Ok(Control::Verdict(_)) | Err(RecvTimeoutError::Timeout) => {}
            }
        }

        self.shared.display.show_freeze(id, Duration::ZERO);
        self.shared.discard_pending();
        self.board.clear_markers_of(id);
        self.shared.transition(|_| PlayerState::Idle) != PlayerState::Terminated
    }

    fn spawn_generator(&self) -> GameResult<JoinHandle<()>> {
        let generator = Generator {
            shared: self.shared.clone(),
            claims: self.claims.clone(),
            board_size: self.board.size(),
            delay: self.computer_delay,
        };
        let name = format!("computer-{}", self.shared.id);
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || generator.run())
            .map_err(|source| GameError::Spawn { name, source })
    }
}

/// Random key presses for a computer player
struct Generator {
    shared: Arc<PlayerShared>,
    claims: Arc<ClaimQueue>,
    board_size: usize,
    delay: Duration,
}

impl Generator {
    fn run(self) {
        let name = thread_name(&self.shared);
        log::info!("Thread {name} starting");
        let mut rng = rand::rng();

        while !self.shared.terminated.load(Ordering::Acquire) {
            if !self.claims.is_processing() {
                let slot = rng.random_range(0..self.board_size);
                self.shared.offer(slot);
            }
            thread::sleep(self.delay);
        }

        log::info!("Thread {name} terminated");
    }
}

fn thread_name(shared: &PlayerShared) -> String {
    thread::current()
        .name()
        .map_or_else(|| format!("player-{}", shared.id), str::to_string)
}

/// Join a thread, mapping a panic to [`GameError::Panicked`]
pub(crate) fn join_named<T>(handle: JoinHandle<T>) -> GameResult<T> {
    let name = handle.thread().name().unwrap_or("unnamed").to_string();
    handle.join().map_err(|_| GameError::Panicked(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;

    fn config() -> GameConfig {
        GameConfig {
            human_players: 1,
            computer_players: 1,
            table_delay_ms: 0,
            point_freeze_ms: 30,
            penalty_freeze_ms: 30,
            ..GameConfig::default()
        }
    }

    fn setup() -> (Player, PlayerHandle, Arc<Board>, Arc<ClaimQueue>) {
        let config = config();
        let board = Arc::new(Board::new(&config, Arc::new(NullDisplay)));
        let claims = Arc::new(ClaimQueue::new());
        let (player, handle) = Player::new(
            0,
            &config,
            board.clone(),
            claims.clone(),
            Arc::new(NullDisplay),
        );
        (player, handle, board, claims)
    }

    #[test]
    fn test_press_places_and_claims() {
        let (player, handle, board, claims) = setup();
        for slot in 0..3 {
            board.place_card(slot, slot);
        }
        player.press(0);
        player.press(1);
        assert!(claims.is_empty());
        player.press(2);
        assert_eq!(claims.len(), 1);
        assert_eq!(handle.state(), PlayerState::Awaiting);
        assert_eq!(board.marker_count(0), 3);
    }

    #[test]
    fn test_press_at_capacity_ignored() {
        let (player, _handle, board, claims) = setup();
        for slot in 0..4 {
            board.place_card(slot, slot);
        }
        for slot in 0..4 {
            player.press(slot);
        }
        assert_eq!(board.marker_count(0), 3);
        assert!(board.markers_at(3).is_empty());
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn test_unmark_returns_to_idle() {
        let (player, handle, board, _claims) = setup();
        for slot in 0..3 {
            board.place_card(slot, slot);
            player.press(slot);
        }
        player.press(1);
        assert_eq!(handle.state(), PlayerState::Idle);
        assert_eq!(board.marker_count(0), 2);
    }

    #[test]
    fn test_empty_slot_discards_queue() {
        let (player, handle, board, _claims) = setup();
        board.place_card(0, 0);
        assert!(handle.submit_input(0));
        assert!(handle.submit_input(0));
        player.press(5);
        assert_eq!(player.inputs.try_iter().count(), 0);
    }

    #[test]
    fn test_inbox_is_bounded() {
        let (_player, handle, _board, _claims) = setup();
        assert!(handle.submit_input(0));
        assert!(handle.submit_input(1));
        assert!(handle.submit_input(2));
        assert!(!handle.submit_input(3));
    }

    #[test]
    fn test_frozen_player_drops_input() {
        let (_player, handle, _board, _claims) = setup();
        handle.penalize();
        assert_eq!(handle.state(), PlayerState::Frozen(Freeze::Penalty));
        assert!(!handle.submit_input(0));
    }

    #[test]
    fn test_reward_scores_once() {
        let (_player, handle, _board, _claims) = setup();
        handle.reward();
        assert_eq!(handle.score(), 1);
        assert_eq!(handle.state(), PlayerState::Frozen(Freeze::Point));
    }

    #[test]
    fn test_freeze_clears_markers_and_resumes() {
        let (player, handle, board, _claims) = setup();
        for slot in 0..2 {
            board.place_card(slot, slot);
            player.press(slot);
        }
        handle.penalize();
        let start = Instant::now();
        let control = player.control.recv().unwrap();
        assert!(player.handle(control));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(handle.state(), PlayerState::Idle);
        assert_eq!(board.marker_count(0), 0);
        assert_eq!(handle.score(), 0);
    }

    #[test]
    fn test_terminate_during_freeze() {
        let (player, handle, _board, _claims) = setup();
        handle.penalize();
        handle.terminate();
        let control = player.control.recv().unwrap();
        assert!(!player.handle(control));
        assert_eq!(handle.state(), PlayerState::Terminated);
    }

    #[test]
    fn test_run_stops_on_terminate() {
        let (player, handle, _board, _claims) = setup();
        let thread = thread::spawn(move || player.run());
        handle.terminate();
        assert!(thread.join().unwrap().is_ok());
    }

    #[test]
    fn test_computer_ignores_human_input() {
        let config = config();
        let board = Arc::new(Board::new(&config, Arc::new(NullDisplay)));
        let (_player, handle) = Player::new(
            1,
            &config,
            board,
            Arc::new(ClaimQueue::new()),
            Arc::new(NullDisplay),
        );
        assert!(!handle.is_human());
        assert!(!handle.submit_input(0));
    }
}
