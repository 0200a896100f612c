//! Converts lock results into outgoing garbage lines.

use crate::piece::Piece;
use crate::spin::Spin;

/// How a cleared lock is rated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClearKind {
    Normal,
    TspinFull,
    TspinMini,
    /// S/Z/J/L/I spin; always rated at the mini row.
    AllSpin,
}

impl ClearKind {
    pub fn from_spin(piece: Piece, spin: Spin) -> Self {
        match (piece, spin) {
            (_, Spin::None) => ClearKind::Normal,
            (Piece::T, Spin::Full) => ClearKind::TspinFull,
            (Piece::T, Spin::Mini) => ClearKind::TspinMini,
            (_, _) => ClearKind::AllSpin,
        }
    }

    pub fn is_spin(self) -> bool {
        self != ClearKind::Normal
    }
}

/// A quad, or any spin that cleared at least one line. Difficult clears
/// start and extend back-to-back streaks.
pub fn is_difficult(cleared: u8, kind: ClearKind) -> bool {
    cleared == 4 || (kind.is_spin() && cleared > 0)
}

/// The attack table configuration, in lines per clear count.
#[derive(Copy, Clone, Debug)]
pub struct AttackTable {
    /// 1..4 cleared, no spin.
    pub clears: [u32; 4],
    /// 1..3 cleared with a full T-spin.
    pub tspin_full: [u32; 3],
    /// 1..3 cleared with a mini T-spin.
    pub tspin_mini: [u32; 3],
    /// 1..4 cleared with an S/Z/J/L/I spin.
    pub allspin: [u32; 4],
    /// Flat reward for emptying the board, any clear count.
    pub perfect_clear: u32,
    /// Back-to-back continuation bonus.
    pub b2b: u32,
}

pub static STANDARD_ATTACK_TABLE: AttackTable = AttackTable {
    clears: [0, 1, 2, 4],
    tspin_full: [2, 4, 6],
    tspin_mini: [0, 1, 2],
    allspin: [0, 1, 2, 4],
    perfect_clear: 10,
    b2b: 1,
};

/// Each KO already scored raises outgoing attacks by 20%.
pub const KO_MULTIPLIER_STEP: f64 = 0.2;

impl AttackTable {
    /// Outgoing lines for a lock. `b2b_before` is the streak flag as it
    /// stood before this lock; updating the flag afterwards is the
    /// caller's job.
    pub fn outgoing(
        &self,
        cleared: u8,
        kind: ClearKind,
        b2b_before: bool,
        perfect: bool,
        kos: u32,
    ) -> u32 {
        if cleared == 0 {
            return 0;
        }
        let i = (cleared - 1) as usize;
        let mut base = if perfect {
            self.perfect_clear
        } else {
            match kind {
                ClearKind::Normal => self.clears[i.min(3)],
                ClearKind::TspinFull => self.tspin_full[i.min(2)],
                ClearKind::TspinMini => self.tspin_mini[i.min(2)],
                ClearKind::AllSpin => self.allspin[i.min(3)],
            }
        };
        if b2b_before && base > 0 {
            base += self.b2b;
        }
        if base == 0 {
            return 0;
        }
        let multiplier = 1.0 + KO_MULTIPLIER_STEP * f64::from(kos);
        ((f64::from(base) * multiplier).floor() as u32).max(1)
    }
}
