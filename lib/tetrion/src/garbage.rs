//! Incoming garbage, buffered by piece placements and cancellable by
//! line clears.

use std::collections::VecDeque;

/// Piece placements an attack waits in the queue before landing.
pub const GARBAGE_BUFFER_PIECES: i8 = 3;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GarbageEntry {
    pub lines: u8,
    pub buffer_pieces: i8,
    pub sender: String,
}

/// FIFO of pending attacks. The drain end and the cancellation end are
/// both the front, so the oldest garbage always resolves first.
#[derive(Clone, Debug, Default)]
pub struct GarbageQueue(VecDeque<GarbageEntry>);

impl GarbageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, lines: u8, sender: &str) {
        if lines == 0 {
            return;
        }
        self.0.push_back(GarbageEntry {
            lines,
            buffer_pieces: GARBAGE_BUFFER_PIECES,
            sender: sender.to_owned(),
        });
    }

    /// Ages every entry by one placement and returns the total lines whose
    /// buffer ran out, ready to be injected into the board.
    pub fn on_piece_locked(&mut self) -> u32 {
        for entry in &mut self.0 {
            entry.buffer_pieces -= 1;
        }
        let mut ready = 0;
        self.0.retain(|entry| {
            if entry.buffer_pieces <= 0 {
                ready += u32::from(entry.lines);
                false
            } else {
                true
            }
        });
        ready
    }

    /// Spends a clear against the queued attacks, oldest first. Entries
    /// that survive get their buffer extended by the full clear size.
    pub fn cancel(&mut self, cleared: u8) {
        if cleared == 0 {
            return;
        }
        let mut remaining = cleared;
        while remaining > 0 {
            let Some(front) = self.0.front_mut() else {
                break;
            };
            if front.lines <= remaining {
                remaining -= front.lines;
                self.0.pop_front();
            } else {
                front.lines -= remaining;
                remaining = 0;
            }
        }
        for entry in &mut self.0 {
            entry.buffer_pieces += cleared as i8;
        }
    }

    pub fn pending_lines(&self) -> u32 {
        self.0.iter().map(|e| u32::from(e.lines)).sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = &GarbageEntry> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_buffer_counts_down_then_drains() {
        let mut q = GarbageQueue::new();
        q.enqueue(2, "alice");
        assert_eq!(q.on_piece_locked(), 0);
        assert_eq!(q.on_piece_locked(), 0);
        assert_eq!(q.on_piece_locked(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn test_drain_merges_ready_entries() {
        let mut q = GarbageQueue::new();
        q.enqueue(1, "alice");
        q.enqueue(3, "bob");
        q.on_piece_locked();
        q.on_piece_locked();
        assert_eq!(q.on_piece_locked(), 4);
    }

    #[test]
    fn test_cancel_spends_from_the_front() {
        let mut q = GarbageQueue::new();
        q.enqueue(3, "alice");
        q.enqueue(2, "bob");
        q.cancel(4);
        let rest = q.entries().cloned().collect::<Vec<_>>();
        assert_eq!(
            rest,
            [GarbageEntry {
                lines: 1,
                buffer_pieces: GARBAGE_BUFFER_PIECES + 4,
                sender: "bob".into(),
            }]
        );
    }

    #[test]
    fn test_cancel_entire_queue() {
        let mut q = GarbageQueue::new();
        q.enqueue(2, "alice");
        q.cancel(5);
        assert!(q.is_empty());
        assert_eq!(q.pending_lines(), 0);
    }

    #[test]
    fn test_zero_line_attacks_are_dropped() {
        let mut q = GarbageQueue::new();
        q.enqueue(0, "alice");
        assert!(q.is_empty());
    }
}
