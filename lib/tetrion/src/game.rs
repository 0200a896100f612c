//! Single-player game state: the board, the bag, the active piece and the
//! lock pipeline that ties the pieces together.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::attack::{is_difficult, AttackTable, ClearKind, STANDARD_ATTACK_TABLE};
use crate::bag::SevenBag;
use crate::falling::ActivePiece;
use crate::garbage::GarbageQueue;
use crate::matrix::{Block, Board};
use crate::piece::{Dir, Piece, Turn};
use crate::spin;

/// Gravity interval on an empty score.
pub const BASE_TICK: Duration = Duration::from_millis(600);

/// Gravity never gets faster than this.
pub const MIN_TICK: Duration = Duration::from_millis(10);

pub const LINES_PER_SPEEDUP: u32 = 5;

pub const SPEEDUP_AMOUNT: Duration = Duration::from_millis(50);

/// Everything that happened when a piece fused into the board.
#[derive(Clone, Debug)]
pub struct LockSummary {
    pub piece: Piece,
    pub cleared: u8,
    pub kind: ClearKind,
    pub perfect: bool,
    /// Streak flag after this lock.
    pub b2b: bool,
    /// Outgoing lines, KO multiplier applied.
    pub attack: u32,
    /// Incoming lines whose buffer ran out on this placement.
    pub garbage_injected: u32,
    pub topped_out: bool,
}

#[derive(Clone, Debug)]
pub struct Game {
    pub board: Board,
    pub active: ActivePiece,
    pub hold: Option<Piece>,
    pub hold_used: bool,
    pub b2b: bool,
    pub lines_cleared: u32,
    pub garbage: GarbageQueue,
    pub dead: bool,
    attack_table: AttackTable,
    bag: SevenBag,
    rng: SmallRng,
}

impl Game {
    pub fn new() -> Self {
        Self::new_seeded(rand::thread_rng().gen())
    }

    pub fn new_seeded(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut bag = SevenBag::new();
        let first = bag.next(&mut rng);
        let mut game = Game {
            board: Board::new(),
            active: ActivePiece::spawn(first),
            hold: None,
            hold_used: false,
            b2b: false,
            lines_cleared: 0,
            garbage: GarbageQueue::new(),
            dead: false,
            attack_table: STANDARD_ATTACK_TABLE,
            bag,
            rng,
        };
        game.dead = game.spawn_collides();
        game
    }

    /// The upcoming piece, for the preview box.
    pub fn preview(&mut self) -> Piece {
        self.bag.peek(&mut self.rng)
    }

    /// Current gravity interval; clears speed it up in steps.
    pub fn gravity_interval(&self) -> Duration {
        let steps = self.lines_cleared / LINES_PER_SPEEDUP;
        BASE_TICK
            .saturating_sub(SPEEDUP_AMOUNT * steps)
            .max(MIN_TICK)
    }

    pub fn move_piece(&mut self, dir: Dir, now: Instant) -> bool {
        !self.dead && self.active.try_shift(&self.board, dir, now)
    }

    pub fn rotate(&mut self, turn: Turn, now: Instant) -> bool {
        !self.dead && self.active.try_rotate(&self.board, turn, now)
    }

    /// One immediate row down, from the soft-drop key.
    pub fn soft_drop(&mut self) -> bool {
        !self.dead && self.active.fall(&self.board)
    }

    /// Swaps the active piece with the hold slot, once per spawn.
    pub fn try_hold(&mut self) -> bool {
        if self.dead || self.hold_used {
            return false;
        }
        let swapped = match self.hold.replace(self.active.piece) {
            Some(held) => held,
            None => self.bag.next(&mut self.rng),
        };
        self.active = ActivePiece::spawn(swapped);
        self.hold_used = true;
        self.dead = self.spawn_collides();
        true
    }

    /// Gravity step: fall one row, or start the lock-delay clock.
    pub fn tick_gravity(&mut self, now: Instant) {
        if self.dead {
            return;
        }
        if !self.active.fall(&self.board) {
            self.active.start_lock_delay(now);
        }
    }

    /// Locks the piece if its grace period has run out.
    pub fn lock_if_expired(&mut self, now: Instant, kos: u32) -> Option<LockSummary> {
        if self.dead || !self.active.lock_expired(now) || !self.active.resting(&self.board) {
            return None;
        }
        Some(self.lock_active(kos))
    }

    /// Drops to the floor and locks immediately, skipping lock delay.
    pub fn hard_drop(&mut self, kos: u32) -> Option<LockSummary> {
        if self.dead {
            return None;
        }
        self.active.sonic_drop(&self.board);
        Some(self.lock_active(kos))
    }

    fn lock_active(&mut self, kos: u32) -> LockSummary {
        let piece = self.active.piece;
        let spin = spin::classify(&self.board, &self.active);
        let kind = ClearKind::from_spin(piece, spin);

        self.board
            .lock(self.active.shape(), self.active.x, self.active.y, Block::from(piece));
        let cleared = self.board.clear_full_rows();
        let perfect = cleared > 0 && self.board.is_empty();

        let attack = self
            .attack_table
            .outgoing(cleared, kind, self.b2b, perfect, kos);
        if cleared > 0 {
            self.b2b = is_difficult(cleared, kind);
            self.garbage.cancel(cleared);
        }
        self.lines_cleared += u32::from(cleared);

        let garbage_injected = self.garbage.on_piece_locked();
        if garbage_injected > 0 {
            self.board.inject_garbage(garbage_injected, &mut self.rng);
        }

        self.spawn_next();

        LockSummary {
            piece,
            cleared,
            kind,
            perfect,
            b2b: self.b2b,
            attack,
            garbage_injected,
            topped_out: self.dead,
        }
    }

    fn spawn_next(&mut self) {
        let piece = self.bag.next(&mut self.rng);
        self.active = ActivePiece::spawn(piece);
        self.hold_used = false;
        self.dead = self.spawn_collides();
    }

    fn spawn_collides(&self) -> bool {
        self.board
            .collides(self.active.shape(), self.active.x, self.active.y + 1)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
