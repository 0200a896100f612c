//! Tetromino definitions: piece names, rotation states and shape matrices.

use core::fmt;
use core::mem::transmute;
use core::ops;

/// The seven tetrominoes, in wire order. The discriminant is the codec piece
/// index; the board color is `discriminant + 1`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum Piece {
    I = 0,
    O = 1,
    T = 2,
    S = 3,
    Z = 4,
    J = 5,
    L = 6,
}

pub static ALL_PIECES: [Piece; 7] = {
    use Piece::*;
    [I, O, T, S, Z, J, L]
};

static PIECE_NAMES: &[u8] = b"IOTSZJL";

impl Piece {
    pub fn name(self) -> &'static str {
        let i = self as usize;
        core::str::from_utf8(&PIECE_NAMES[i..][..1]).unwrap()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(i: u8) -> Option<Piece> {
        ALL_PIECES.get(i as usize).copied()
    }

    /// Side length of the piece's rotation box.
    pub fn size(self) -> i8 {
        match self {
            Piece::I => 4,
            Piece::O => 2,
            _ => 3,
        }
    }

    pub fn shape(self, r: Rot) -> Shape {
        SHAPES[self as usize][r as usize]
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Horizontal step direction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Dir {
    Left = -1,
    Right = 1,
}

impl ops::Add<Dir> for i8 {
    type Output = i8;
    fn add(self, rhs: Dir) -> i8 {
        self + rhs as i8
    }
}

/// Represents the rotation state of a shape.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(u8)]
pub enum Rot {
    /// Spawn orientation.
    #[default]
    N = 0,
    /// One CW rotation.
    E = 1,
    /// Two rotations in either direction.
    S = 2,
    /// One CCW rotation, or three CW rotations.
    W = 3,
}

impl From<u8> for Rot {
    #[inline]
    fn from(v: u8) -> Self {
        unsafe { transmute(v & 3) }
    }
}

impl From<Rot> for u8 {
    #[inline]
    fn from(r: Rot) -> Self {
        r as u8
    }
}

/// A rotation input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Turn {
    Cw = 1,
    Flip = 2,
    Ccw = 3,
}

impl ops::Add<Turn> for Rot {
    type Output = Rot;
    fn add(self, t: Turn) -> Rot {
        (self as u8 + t as u8).into()
    }
}

/// An n×n shape matrix anchored at its top-left corner. Cell data is a 4×4
/// bitmask with bit `row * 4 + col` set for an occupied cell; rows index
/// downward, matching board coordinates.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Shape {
    n: i8,
    bits: u16,
}

impl Shape {
    pub const fn new(n: i8, bits: u16) -> Self {
        Self { n, bits }
    }

    /// Side length of the rotation box.
    pub fn size(&self) -> i8 {
        self.n
    }

    /// Iterates the `(dx, dy)` offsets of occupied cells relative to the
    /// matrix's top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> {
        let bits = self.bits;
        (0..16i8)
            .filter(move |i| bits & (1 << i) != 0)
            .map(|i| (i % 4, i / 4))
    }

    pub fn contains(&self, dx: i8, dy: i8) -> bool {
        if !(0..4).contains(&dx) || !(0..4).contains(&dy) {
            return false;
        }
        self.bits & (1 << (dy * 4 + dx)) != 0
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_list();
        for y in 0..self.n {
            let mut bs = [b'.'; 4];
            for (i, b) in bs.iter_mut().enumerate().take(self.n as usize) {
                if self.contains(i as i8, y) {
                    *b = b'x';
                }
            }
            let s = core::str::from_utf8(&bs[..self.n as usize]).unwrap();
            f.entry(&s);
        }
        f.finish()
    }
}

/// Shape matrices for every piece and rotation state. Rotation `r` is the
/// spawn matrix rotated CW `r` times in place; nibbles in the literals read
/// bottom row first.
static SHAPES: [[Shape; 4]; 7] = [
    // ....  ..I.  ....  .I..
    // IIII  ..I.  ....  .I..
    // ....  ..I.  IIII  .I..
    // ....  ..I.  ....  .I..
    [
        Shape::new(4, 0b_0000_0000_1111_0000),
        Shape::new(4, 0b_0100_0100_0100_0100),
        Shape::new(4, 0b_0000_1111_0000_0000),
        Shape::new(4, 0b_0010_0010_0010_0010),
    ],
    // OO
    // OO
    [
        Shape::new(2, 0b_0011_0011),
        Shape::new(2, 0b_0011_0011),
        Shape::new(2, 0b_0011_0011),
        Shape::new(2, 0b_0011_0011),
    ],
    // .T.  .T.  ...  .T.
    // TTT  .TT  TTT  TT.
    // ...  .T.  .T.  .T.
    [
        Shape::new(3, 0b_0000_0111_0010),
        Shape::new(3, 0b_0010_0110_0010),
        Shape::new(3, 0b_0010_0111_0000),
        Shape::new(3, 0b_0010_0011_0010),
    ],
    // .SS  .S.  ...  S..
    // SS.  .SS  .SS  SS.
    // ...  ..S  SS.  .S.
    [
        Shape::new(3, 0b_0000_0011_0110),
        Shape::new(3, 0b_0100_0110_0010),
        Shape::new(3, 0b_0011_0110_0000),
        Shape::new(3, 0b_0010_0011_0001),
    ],
    // ZZ.  ..Z  ...  .Z.
    // .ZZ  .ZZ  ZZ.  ZZ.
    // ...  .Z.  .ZZ  Z..
    [
        Shape::new(3, 0b_0000_0110_0011),
        Shape::new(3, 0b_0010_0110_0100),
        Shape::new(3, 0b_0110_0011_0000),
        Shape::new(3, 0b_0001_0011_0010),
    ],
    // J..  .JJ  ...  .J.
    // JJJ  .J.  JJJ  .J.
    // ...  .J.  ..J  JJ.
    [
        Shape::new(3, 0b_0000_0111_0001),
        Shape::new(3, 0b_0010_0010_0110),
        Shape::new(3, 0b_0100_0111_0000),
        Shape::new(3, 0b_0011_0010_0010),
    ],
    // ..L  .L.  ...  LL.
    // LLL  .L.  LLL  .L.
    // ...  .LL  L..  .L.
    [
        Shape::new(3, 0b_0000_0111_0100),
        Shape::new(3, 0b_0110_0010_0010),
        Shape::new(3, 0b_0001_0111_0000),
        Shape::new(3, 0b_0010_0010_0011),
    ],
];
