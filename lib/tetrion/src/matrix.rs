//! The playfield grid.

use core::fmt;
use core::mem::transmute;

use rand::Rng;

use crate::piece::{Piece, Shape};

pub const COLS: i8 = 10;
pub const ROWS: i8 = 20;

/// A non-empty cell: one of the seven piece colors, or garbage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum Block {
    I = 1,
    O = 2,
    T = 3,
    S = 4,
    Z = 5,
    J = 6,
    L = 7,
    Garbage = 8,
}

pub type Cell = Option<Block>;

static BLOCK_NAMES: [&str; 9] = ["", "I", "O", "T", "S", "Z", "J", "L", "G"];

impl Block {
    pub fn name(self) -> &'static str {
        BLOCK_NAMES[self as usize]
    }

    pub fn from_u8(v: u8) -> Option<Block> {
        match v {
            1..=8 => Some(unsafe { transmute::<u8, Block>(v) }),
            _ => None,
        }
    }
}

impl From<Piece> for Block {
    fn from(pc: Piece) -> Self {
        // piece index 0..6 maps onto colors 1..7
        unsafe { transmute(pc.index() + 1) }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed 10×20 grid of cells, row 0 at the top.
#[derive(Clone, Eq, PartialEq)]
pub struct Board([[Cell; COLS as usize]; ROWS as usize]);

impl Board {
    pub fn new() -> Self {
        Self([[None; COLS as usize]; ROWS as usize])
    }

    pub fn rows(&self) -> &[[Cell; COLS as usize]; ROWS as usize] {
        &self.0
    }

    /// In-range cell read. Out-of-range coordinates read as empty; use
    /// [`Board::solid`] for collision semantics.
    pub fn cell(&self, x: i8, y: i8) -> Cell {
        if !(0..COLS).contains(&x) || !(0..ROWS).contains(&y) {
            return None;
        }
        self.0[y as usize][x as usize]
    }

    pub fn set(&mut self, x: i8, y: i8, cell: Cell) {
        if (0..COLS).contains(&x) && (0..ROWS).contains(&y) {
            self.0[y as usize][x as usize] = cell;
        }
    }

    /// The corner test used by spin detection: side and bottom walls count
    /// as filled, the space above the board does not.
    pub fn solid(&self, x: i8, y: i8) -> bool {
        if y < 0 {
            return false;
        }
        if !(0..COLS).contains(&x) || y >= ROWS {
            return true;
        }
        self.0[y as usize][x as usize].is_some()
    }

    /// True iff any occupied cell of `shape` at offset `(x, y)` leaves the
    /// walls or overlaps the stack. Cells above row 0 only collide
    /// horizontally.
    pub fn collides(&self, shape: Shape, x: i8, y: i8) -> bool {
        shape.cells().any(|(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            if !(0..COLS).contains(&nx) || ny >= ROWS {
                return true;
            }
            ny >= 0 && self.0[ny as usize][nx as usize].is_some()
        })
    }

    /// Fuses `shape` into the grid. Cells above row 0 are dropped.
    pub fn lock(&mut self, shape: Shape, x: i8, y: i8, block: Block) {
        for (dx, dy) in shape.cells() {
            let (nx, ny) = (x + dx, y + dy);
            if (0..COLS).contains(&nx) && (0..ROWS).contains(&ny) {
                self.0[ny as usize][nx as usize] = Some(block);
            }
        }
    }

    /// Removes fully-filled rows, prepending empty rows at the top, and
    /// returns how many were removed.
    pub fn clear_full_rows(&mut self) -> u8 {
        let mut out = [[None; COLS as usize]; ROWS as usize];
        let mut dst = ROWS as usize;
        for src in (0..ROWS as usize).rev() {
            if self.0[src].iter().any(|c| c.is_none()) {
                dst -= 1;
                out[dst] = self.0[src];
            }
        }
        self.0 = out;
        dst as u8
    }

    /// Pushes `n` garbage rows in from the bottom, each with one random
    /// hole. Whatever occupied the top rows spills off.
    pub fn inject_garbage(&mut self, n: u32, rng: &mut impl Rng) {
        for _ in 0..n {
            self.0.copy_within(1.., 0);
            let hole = rng.gen_range(0..COLS as usize);
            let bottom = &mut self.0[ROWS as usize - 1];
            *bottom = [Some(Block::Garbage); COLS as usize];
            bottom[hole] = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|row| row.iter().all(|c| c.is_none()))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn row_to_string(row: &[Cell]) -> String {
            row.iter().map(|c| c.map_or("_", |b| b.name())).collect()
        }

        f.debug_list()
            .entries(self.0.iter().map(|row| row_to_string(row)))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::piece::Rot;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn fill_row(board: &mut Board, y: i8, except: &[i8]) {
        for x in 0..COLS {
            if !except.contains(&x) {
                board.set(x, y, Some(Block::Garbage));
            }
        }
    }

    #[test]
    fn test_collides_bounds() {
        let board = Board::new();
        let shape = Piece::O.shape(Rot::N);
        assert!(!board.collides(shape, 0, 0));
        assert!(board.collides(shape, -1, 0));
        assert!(board.collides(shape, COLS - 1, 0));
        assert!(!board.collides(shape, COLS - 2, 0));
        assert!(board.collides(shape, 0, ROWS - 1));
        assert!(!board.collides(shape, 0, ROWS - 2));
        // above the board only the walls collide
        assert!(!board.collides(shape, 0, -3));
        assert!(board.collides(shape, -1, -3));
    }

    #[test]
    fn test_collides_stack() {
        let mut board = Board::new();
        board.set(4, 10, Some(Block::T));
        let shape = Piece::O.shape(Rot::N);
        assert!(board.collides(shape, 4, 9));
        assert!(board.collides(shape, 3, 10));
        assert!(!board.collides(shape, 5, 10));
        assert!(!board.collides(shape, 4, 11));
    }

    #[test]
    fn test_lock_clips_above_board() {
        let mut board = Board::new();
        // T at y = -1: only the bottom row of the matrix lands on the board
        board.lock(Piece::T.shape(Rot::N), 3, -1, Block::T);
        assert_eq!(board.cell(3, 0), Some(Block::T));
        assert_eq!(board.cell(4, 0), Some(Block::T));
        assert_eq!(board.cell(5, 0), Some(Block::T));
        assert_eq!(board.cell(4, -1), None);
        assert_eq!(board.rows()[0].iter().filter(|c| c.is_some()).count(), 3);
    }

    #[test]
    fn test_clear_full_rows_preserves_column_order() {
        let mut board = Board::new();
        board.set(0, 15, Some(Block::I));
        fill_row(&mut board, 17, &[]);
        board.set(0, 18, Some(Block::J));
        fill_row(&mut board, 19, &[]);
        let cleared = board.clear_full_rows();
        assert_eq!(cleared, 2);
        // survivors keep their order, shifted down past the removed rows
        assert_eq!(board.cell(0, 17), Some(Block::I));
        assert_eq!(board.cell(0, 19), Some(Block::J));
        assert_eq!(board.cell(0, 15), None);
    }

    #[test]
    fn test_clear_full_rows_none_full() {
        let mut board = Board::new();
        fill_row(&mut board, 19, &[3]);
        let before = board.clone();
        assert_eq!(board.clear_full_rows(), 0);
        assert_eq!(board, before);
    }

    #[test]
    fn test_inject_garbage() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut board = Board::new();
        board.set(0, 19, Some(Block::I));
        board.inject_garbage(2, &mut rng);
        assert_eq!(board.cell(0, 17), Some(Block::I));
        for y in [18, 19] {
            let holes = (0..COLS).filter(|&x| board.cell(x, y).is_none()).count();
            assert_eq!(holes, 1, "row {y}");
            assert!((0..COLS)
                .filter_map(|x| board.cell(x, y))
                .all(|b| b == Block::Garbage));
        }
    }

    #[test]
    fn test_inject_garbage_spills_top() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut board = Board::new();
        fill_row(&mut board, 0, &[0]);
        board.inject_garbage(1, &mut rng);
        // old top row fell off the world; board is still 10x20 with values 0..8
        assert_eq!(board.rows().len(), ROWS as usize);
        for row in board.rows() {
            for cell in row {
                if let Some(b) = cell {
                    assert!((1..=8).contains(&(*b as u8)));
                }
            }
        }
    }

    #[test]
    fn test_is_empty() {
        let mut board = Board::new();
        assert!(board.is_empty());
        board.set(9, 19, Some(Block::L));
        assert!(!board.is_empty());
    }
}
