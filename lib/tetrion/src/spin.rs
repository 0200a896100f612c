//! Spin recognition, evaluated at lock time before rows are removed.

use crate::falling::ActivePiece;
use crate::kicks::LONG_KICK;
use crate::matrix::Board;
use crate::piece::{Piece, Rot, Turn};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Spin {
    None,
    Mini,
    Full,
}

impl Spin {
    pub fn is_spin(self) -> bool {
        self != Spin::None
    }
}

/// Corner offsets around the center of the T matrix, reading order.
const CORNERS: [(i8, i8); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Classifies a lock. Only meaningful when called with the piece in its
/// final position, before `clear_full_rows`.
pub fn classify(board: &Board, active: &ActivePiece) -> Spin {
    let info = active.last_rotation;
    if !info.rotated {
        // translation landing
        return Spin::None;
    }
    match active.piece {
        Piece::T => classify_t(board, active),
        Piece::O => Spin::None,
        // S, Z, J, L, I spin whenever the final rotation needed a kick
        _ if info.kick > 0 => Spin::Mini,
        _ => Spin::None,
    }
}

/// The 3-corner rule. Walls to the side and below count as filled; space
/// above the board does not. Both front corners filled makes the spin
/// full, as does landing on the canonical long kick.
fn classify_t(board: &Board, active: &ActivePiece) -> Spin {
    let (cx, cy) = (active.x + 1, active.y + 1);
    let filled = CORNERS.map(|(dx, dy)| board.solid(cx + dx, cy + dy));
    if filled.iter().filter(|&&f| f).count() < 3 {
        return Spin::None;
    }

    // front corners, as CORNERS indices: the two the flat side faces
    let front = match active.rot {
        Rot::N => [0, 1],
        Rot::E => [1, 3],
        Rot::S => [2, 3],
        Rot::W => [0, 2],
    };
    if front.iter().all(|&i| filled[i]) {
        return Spin::Full;
    }

    let info = active.last_rotation;
    let long_kick = info.kick == LONG_KICK && info.turn != Some(Turn::Flip);
    if long_kick {
        Spin::Full
    } else {
        Spin::Mini
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::falling::RotationInfo;
    use crate::matrix::Block;
    use crate::piece::Turn;

    fn t_at(x: i8, y: i8, rot: Rot, kick: usize) -> ActivePiece {
        let mut fp = ActivePiece::spawn(Piece::T);
        fp.x = x;
        fp.y = y;
        fp.rot = rot;
        fp.last_rotation = RotationInfo {
            rotated: true,
            kick,
            turn: Some(Turn::Cw),
        };
        fp
    }

    fn board_with(cells: &[(i8, i8)]) -> Board {
        let mut board = Board::new();
        for &(x, y) in cells {
            board.set(x, y, Some(Block::Garbage));
        }
        board
    }

    #[test]
    fn test_three_corners_both_front_is_full() {
        // T pointing up at (3,10): center (4,11), front corners (3,10),(5,10)
        let board = board_with(&[(3, 10), (5, 10), (3, 12)]);
        let spin = classify(&board, &t_at(3, 10, Rot::N, 1));
        assert_eq!(spin, Spin::Full);
    }

    #[test]
    fn test_three_corners_one_front_is_mini() {
        let board = board_with(&[(3, 10), (3, 12), (5, 12)]);
        let spin = classify(&board, &t_at(3, 10, Rot::N, 1));
        assert_eq!(spin, Spin::Mini);
    }

    #[test]
    fn test_long_kick_promotes_mini() {
        let board = board_with(&[(3, 10), (3, 12), (5, 12)]);
        let spin = classify(&board, &t_at(3, 10, Rot::N, LONG_KICK));
        assert_eq!(spin, Spin::Full);
    }

    #[test]
    fn test_two_corners_is_not_a_spin() {
        let board = board_with(&[(3, 10), (5, 12)]);
        assert_eq!(classify(&board, &t_at(3, 10, Rot::N, 1)), Spin::None);
    }

    #[test]
    fn test_translation_landing_is_not_a_spin() {
        let board = board_with(&[(3, 10), (5, 10), (3, 12), (5, 12)]);
        let mut fp = t_at(3, 10, Rot::N, 1);
        fp.last_rotation = RotationInfo::default();
        assert_eq!(classify(&board, &fp), Spin::None);
    }

    #[test]
    fn test_walls_count_as_corners() {
        // T against the left wall and floor: center (0,18); the two left
        // corners are wall, the right two are stack
        let board = board_with(&[(1, 17), (1, 19)]);
        let spin = classify(&board, &t_at(-1, 17, Rot::E, 1));
        assert_eq!(spin, Spin::Full);
    }

    #[test]
    fn test_space_above_board_does_not_count() {
        // center at (4,0): both top corners are above the board
        let board = board_with(&[(3, 1), (5, 1)]);
        assert_eq!(classify(&board, &t_at(3, -1, Rot::S, 1)), Spin::None);
    }

    #[test]
    fn test_other_pieces_spin_on_kick() {
        let board = Board::new();
        let mut fp = ActivePiece::spawn(Piece::S);
        fp.last_rotation = RotationInfo {
            rotated: true,
            kick: 2,
            turn: Some(Turn::Ccw),
        };
        assert_eq!(classify(&board, &fp), Spin::Mini);

        fp.last_rotation.kick = 0;
        assert_eq!(classify(&board, &fp), Spin::None);
    }
}
