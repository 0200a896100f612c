//! Guideline falling-block rules: pieces, kicks, the board, spin and
//! attack scoring, and the single-player game state machine.

pub mod matrix;
pub use matrix::{Block, Board, Cell, COLS, ROWS};

pub mod piece;
pub use piece::{Dir, Piece, Rot, Shape, Turn, ALL_PIECES};

pub mod kicks;

pub mod bag;
pub use bag::SevenBag;

pub mod falling;
pub use falling::{ActivePiece, RotationInfo, LOCK_DELAY, LOCK_DELAY_RESETS};

pub mod spin;
pub use spin::Spin;

pub mod attack;
pub use attack::{AttackTable, ClearKind, STANDARD_ATTACK_TABLE};

pub mod garbage;
pub use garbage::{GarbageEntry, GarbageQueue, GARBAGE_BUFFER_PIECES};

pub mod game;
pub use game::{Game, LockSummary, BASE_TICK, MIN_TICK};
