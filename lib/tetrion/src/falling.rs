//! The active falling piece: translation, rotation through the kick
//! tables, drops, and lock-delay bookkeeping.

use std::time::{Duration, Instant};

use crate::kicks::wall_kicks;
use crate::matrix::{Board, COLS};
use crate::piece::{Dir, Piece, Rot, Shape, Turn};

/// Grace period while resting before the piece fuses into the board.
pub const LOCK_DELAY: Duration = Duration::from_millis(500);

/// How many times a move or rotation may restart the grace period.
pub const LOCK_DELAY_RESETS: u8 = 15;

/// What the last successful maneuver was, consumed by spin detection.
/// Cleared on spawn, hold and any horizontal translation; downward steps
/// leave it alone.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RotationInfo {
    pub rotated: bool,
    pub kick: usize,
    pub turn: Option<Turn>,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct LockState {
    pub since: Option<Instant>,
    pub resets: u8,
}

#[derive(Clone, Debug)]
pub struct ActivePiece {
    pub piece: Piece,
    pub rot: Rot,
    pub x: i8,
    pub y: i8,
    pub lock: LockState,
    pub last_rotation: RotationInfo,
}

impl ActivePiece {
    /// Places a fresh piece at the spawn position, straddling the top edge.
    pub fn spawn(piece: Piece) -> Self {
        Self {
            piece,
            rot: Rot::N,
            x: (COLS - piece.size()) / 2,
            y: -1,
            lock: LockState::default(),
            last_rotation: RotationInfo::default(),
        }
    }

    pub fn shape(&self) -> Shape {
        self.piece.shape(self.rot)
    }

    /// Board-coordinate cells currently occupied by the piece.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> {
        let (x, y) = (self.x, self.y);
        self.shape().cells().map(move |(dx, dy)| (x + dx, y + dy))
    }

    /// True when the piece is supported and cannot fall further.
    pub fn resting(&self, board: &Board) -> bool {
        board.collides(self.shape(), self.x, self.y + 1)
    }

    /// Row the piece would come to rest on under a hard drop.
    pub fn ghost_y(&self, board: &Board) -> i8 {
        let shape = self.shape();
        let mut y = self.y;
        while !board.collides(shape, self.x, y + 1) {
            y += 1;
        }
        y
    }

    /// One step left or right. A successful step while resting consumes a
    /// lock-delay reset.
    pub fn try_shift(&mut self, board: &Board, dir: Dir, now: Instant) -> bool {
        if board.collides(self.shape(), self.x + dir, self.y) {
            return false;
        }
        self.x = self.x + dir;
        self.last_rotation = RotationInfo::default();
        self.refresh_lock_delay(board, now);
        true
    }

    /// Rotates through the kick table, committing the first offset that
    /// fits. O never rotates.
    pub fn try_rotate(&mut self, board: &Board, turn: Turn, now: Instant) -> bool {
        if self.piece == Piece::O {
            return false;
        }
        let to = self.rot + turn;
        let rotated = self.piece.shape(to);
        for (i, &(dx, dy)) in wall_kicks(self.piece, self.rot, turn).iter().enumerate() {
            if board.collides(rotated, self.x + dx, self.y + dy) {
                continue;
            }
            self.x += dx;
            self.y += dy;
            self.rot = to;
            self.last_rotation = RotationInfo {
                rotated: true,
                kick: i,
                turn: Some(turn),
            };
            self.refresh_lock_delay(board, now);
            return true;
        }
        false
    }

    /// One row down, as used by both gravity and soft drop. A successful
    /// step leaves the resting state.
    pub fn fall(&mut self, board: &Board) -> bool {
        if self.resting(board) {
            return false;
        }
        self.y += 1;
        self.lock.since = None;
        true
    }

    /// Drops to the resting row and returns how far the piece fell.
    pub fn sonic_drop(&mut self, board: &Board) -> i8 {
        let target = self.ghost_y(board);
        let dy = target - self.y;
        self.y = target;
        dy
    }

    /// True once the resting grace period has been used up.
    pub fn lock_expired(&self, now: Instant) -> bool {
        match self.lock.since {
            Some(since) => now.duration_since(since) >= LOCK_DELAY,
            None => false,
        }
    }

    /// Starts the grace period the first time the piece comes to rest.
    pub fn start_lock_delay(&mut self, now: Instant) {
        self.lock.since.get_or_insert(now);
    }

    fn refresh_lock_delay(&mut self, board: &Board, now: Instant) {
        if !self.resting(board) {
            return;
        }
        if self.lock.resets < LOCK_DELAY_RESETS {
            self.lock.resets += 1;
            self.lock.since = Some(now);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::matrix::Block;

    fn floor_board() -> Board {
        let mut board = Board::new();
        for x in 0..COLS {
            board.set(x, 19, Some(Block::Garbage));
        }
        board
    }

    #[test]
    fn test_spawn_positions() {
        assert_eq!((ActivePiece::spawn(Piece::I).x, ActivePiece::spawn(Piece::I).y), (3, -1));
        assert_eq!(ActivePiece::spawn(Piece::O).x, 4);
        assert_eq!(ActivePiece::spawn(Piece::T).x, 3);
        assert!(!ActivePiece::spawn(Piece::T).last_rotation.rotated);
    }

    #[test]
    fn test_shift_clears_rotation_info() {
        let board = Board::new();
        let now = Instant::now();
        let mut fp = ActivePiece::spawn(Piece::T);
        fp.y = 5;
        assert!(fp.try_rotate(&board, Turn::Cw, now));
        assert!(fp.last_rotation.rotated);
        assert!(fp.try_shift(&board, Dir::Right, now));
        assert!(!fp.last_rotation.rotated);
    }

    #[test]
    fn test_fall_keeps_rotation_info() {
        let board = Board::new();
        let now = Instant::now();
        let mut fp = ActivePiece::spawn(Piece::T);
        fp.y = 5;
        assert!(fp.try_rotate(&board, Turn::Cw, now));
        assert!(fp.fall(&board));
        assert!(fp.last_rotation.rotated);
    }

    #[test]
    fn test_wall_kick_off_left_wall() {
        let board = Board::new();
        let now = Instant::now();
        // vertical I hugging the left wall: 1->2 needs a kick to fit
        let mut fp = ActivePiece::spawn(Piece::I);
        fp.rot = Rot::E;
        fp.x = -2;
        fp.y = 5;
        assert!(!board.collides(fp.shape(), fp.x, fp.y));
        assert!(fp.try_rotate(&board, Turn::Cw, now));
        assert_eq!(fp.rot, Rot::S);
        assert!(fp.last_rotation.kick > 0);
    }

    #[test]
    fn test_sonic_drop_then_rest() {
        let board = floor_board();
        let mut fp = ActivePiece::spawn(Piece::T);
        let dy = fp.sonic_drop(&board);
        assert!(dy > 0);
        assert!(fp.resting(&board));
        assert_eq!(fp.sonic_drop(&board), 0);
        assert_eq!(fp.y, 17);
    }

    #[test]
    fn test_lock_delay_reset_limit() {
        let board = floor_board();
        let t0 = Instant::now();
        let mut fp = ActivePiece::spawn(Piece::T);
        fp.sonic_drop(&board);
        fp.start_lock_delay(t0);

        // a wiggle every 100ms keeps refreshing the grace period...
        let mut now = t0;
        for i in 0..LOCK_DELAY_RESETS {
            now += Duration::from_millis(100);
            let dir = if i % 2 == 0 { Dir::Right } else { Dir::Left };
            assert!(fp.try_shift(&board, dir, now));
            assert!(!fp.lock_expired(now + Duration::from_millis(499)));
        }

        // ...but the 16th wiggle no longer does
        let last_refresh = fp.lock.since.unwrap();
        now += Duration::from_millis(100);
        assert!(fp.try_shift(&board, Dir::Right, now));
        assert_eq!(fp.lock.since, Some(last_refresh));
        assert!(fp.lock_expired(last_refresh + LOCK_DELAY));
    }

    #[test]
    fn test_fall_clears_lock_delay() {
        let board = floor_board();
        let t0 = Instant::now();
        let mut fp = ActivePiece::spawn(Piece::T);
        fp.y = 10;
        fp.start_lock_delay(t0);
        assert!(fp.fall(&board));
        assert!(fp.lock.since.is_none());
        assert!(!fp.lock_expired(t0 + LOCK_DELAY));
    }
}
