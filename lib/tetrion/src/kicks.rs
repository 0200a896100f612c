//! Guideline wall-kick offset tables, in board coordinates (positive `dy`
//! steps downward).

use crate::piece::{Piece, Rot, Turn};

/// Offsets attempted per rotation, in order. The first is always `(0, 0)`.
pub const KICKS: usize = 5;

/// Index of the canonical long wall kick. A T rotation that lands on this
/// slot upgrades a mini T-spin to a full one.
pub const LONG_KICK: usize = KICKS - 1;

/// 90° kicks for J, L, S, T, Z, indexed by the starting rotation and the
/// turn (CW first, CCW second).
static JLSTZ_KICKS: [[[(i8, i8); KICKS]; 2]; 4] = [
    [
        /* 0->1 */ [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
        /* 0->3 */ [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    ],
    [
        /* 1->2 */ [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
        /* 1->0 */ [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    ],
    [
        /* 2->3 */ [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
        /* 2->1 */ [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    ],
    [
        /* 3->0 */ [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
        /* 3->2 */ [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    ],
];

/// 90° kicks for I.
static I_KICKS: [[[(i8, i8); KICKS]; 2]; 4] = [
    [
        /* 0->1 */ [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
        /* 0->3 */ [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
    ],
    [
        /* 1->2 */ [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
        /* 1->0 */ [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    ],
    [
        /* 2->3 */ [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
        /* 2->1 */ [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
    ],
    [
        /* 3->0 */ [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
        /* 3->2 */ [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
    ],
];

/// 180° kicks for J, L, S, T, Z, indexed by the starting rotation. The
/// guideline leaves these open; small nudges, one row up preferred.
static JLSTZ_KICKS_180: [[(i8, i8); KICKS]; 4] = [
    /* 0->2 */ [(0, 0), (0, -1), (1, -1), (-1, -1), (1, 0)],
    /* 1->3 */ [(0, 0), (1, 0), (1, -2), (1, -1), (0, -2)],
    /* 2->0 */ [(0, 0), (0, 1), (-1, 1), (1, 1), (-1, 0)],
    /* 3->1 */ [(0, 0), (-1, 0), (-1, -2), (-1, -1), (0, -2)],
];

/// 180° kicks for I.
static I_KICKS_180: [[(i8, i8); KICKS]; 4] = [
    /* 0->2 */ [(0, 0), (0, 1), (0, -1), (1, 0), (-1, 0)],
    /* 1->3 */ [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)],
    /* 2->0 */ [(0, 0), (0, -1), (0, 1), (-1, 0), (1, 0)],
    /* 3->1 */ [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
];

/// Offset list to attempt for rotating `piece` out of `from` by `turn`.
/// O is rotation-invariant and never consults these.
pub fn wall_kicks(piece: Piece, from: Rot, turn: Turn) -> &'static [(i8, i8); KICKS] {
    let i = from as usize;
    match turn {
        Turn::Flip => {
            if piece == Piece::I {
                &I_KICKS_180[i]
            } else {
                &JLSTZ_KICKS_180[i]
            }
        }
        Turn::Cw | Turn::Ccw => {
            let j = (turn as usize) >> 1; // Cw => 0, Ccw => 1
            if piece == Piece::I {
                &I_KICKS[i][j]
            } else {
                &JLSTZ_KICKS[i][j]
            }
        }
    }
}
