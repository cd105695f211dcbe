//! The bounded beginning-of-line cache.
//!
//! A FIFO of Locations known to be beginnings of wrapped display rows,
//! capped at a small capacity so a rescue after an edit costs at most a few
//! dozen pointer walks regardless of document size.

use core_text::Location;
use std::collections::VecDeque;

/// Enough rungs to frame a tall terminal
/// without letting rescue cost grow unboundedly.
pub const DEFAULT_CAPACITY: usize = 48;

#[derive(Debug, Clone)]
pub struct Ladder {
    rungs: VecDeque<Location>,
    capacity: usize,
}

impl Ladder {
    pub fn new(capacity: usize) -> Self {
        Self {
            rungs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.rungs.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn front(&self) -> Option<Location> {
        self.rungs.front().copied()
    }

    pub fn back(&self) -> Option<Location> {
        self.rungs.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Location> + '_ {
        self.rungs.iter().copied()
    }

    pub fn contains(&self, loc: Location) -> bool {
        self.rungs.contains(&loc)
    }

    pub fn index_of(&self, loc: Location) -> Option<usize> {
        self.rungs.iter().position(|&r| r == loc)
    }

    pub fn get(&self, idx: usize) -> Option<Location> {
        self.rungs.get(idx).copied()
    }

    /// Appends a rung, evicting the oldest one if at capacity. Rungs are
    /// pushed in increasing-position order by every caller in `formatter.rs`.
    /// The ladder itself does not enforce ordering.
    pub fn push_back(&mut self, loc: Location) {
        if self.rungs.len() == self.capacity {
            self.rungs.pop_front();
        }
        self.rungs.push_back(loc);
    }
}
