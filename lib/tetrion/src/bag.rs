//! 7-bag piece randomizer.

use std::collections::VecDeque;

use rand::Rng;

use crate::piece::{Piece, ALL_PIECES};

/// Deals pieces in shuffled groups of seven, so every seven consecutive
/// draws contain each piece exactly once.
#[derive(Clone, Debug, Default)]
pub struct SevenBag {
    queue: VecDeque<Piece>,
}

impl SevenBag {
    pub fn new() -> Self {
        Self::default()
    }

    fn refill(&mut self, rng: &mut impl Rng) {
        if !self.queue.is_empty() {
            return;
        }
        let mut pool = ALL_PIECES.to_vec();
        while !pool.is_empty() {
            let i = rng.gen_range(0..pool.len());
            self.queue.push_back(pool.swap_remove(i));
        }
    }

    pub fn next(&mut self, rng: &mut impl Rng) -> Piece {
        self.refill(rng);
        self.queue.pop_front().unwrap_or(Piece::I)
    }

    /// Non-consuming look at the upcoming piece, for the preview box.
    pub fn peek(&mut self, rng: &mut impl Rng) -> Piece {
        self.refill(rng);
        self.queue.front().copied().unwrap_or(Piece::I)
    }
}
