//! Hash history and repetition detection.

/// Ordered Zobrist keys: game-root through the current search path. Pushed on every
/// make, popped on every unmake. The external driver pre-populates it with the keys
/// of positions played from the game root up to (not including) the search root.
#[derive(Clone, Debug, Default)]
pub struct HashHistory {
    keys: Vec<u64>,
}

impl HashHistory {
    pub fn new() -> Self {
        HashHistory { keys: Vec::with_capacity(128) }
    }

    pub fn push(&mut self, key: u64) {
        self.keys.push(key);
    }

    pub fn pop(&mut self) {
        self.keys.pop();
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Walks the history backward in steps of 2 (same side to move at each step),
    /// starting from two plies before the most recent entry — the caller's own
    /// position is always the last pushed entry, so index `size - 1` is skipped as a
    /// trivial self-match. Stops once the index would fall below `size -
    /// halfmove_clock` (an irreversible move clears any relevance of earlier
    /// history). Counts matches of `key`; returns true once `draw` matches have been
    /// seen.
    pub fn is_repetition(&self, key: u64, halfmove_clock: u32, draw: u32) -> bool {
        let size = self.keys.len();
        if size == 0 {
            return false;
        }
        let floor = size.saturating_sub(halfmove_clock as usize);
        let mut matches = 0u32;
        let mut i = size - 1;
        while i >= 2 {
            i -= 2;
            if i < floor {
                break;
            }
            if self.keys[i] == key {
                matches += 1;
                if matches >= draw {
                    return true;
                }
            }
        }
        false
    }
}
