//! Fixed-size, direct-mapped transposition table.
//!
//! One slot per `key mod TT_SIZE`; no hashmap, no chaining. `TT_SIZE = 2^19 - 1` is
//! deliberately not a power of two, so the low bits of a Zobrist key (which often
//! correlate across sibling positions) don't all alias into the same bucket.

use crate::board::ChessMove;
use crate::score::{Score, VALUE_NONE, VALUE_TB_LOSS_IN_MAX_PLY, VALUE_TB_WIN_IN_MAX_PLY};

pub const TT_SIZE: usize = (1 << 19) - 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    None,
    Upper,
    Lower,
    Exact,
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub depth: i32,
    pub bound: Bound,
    pub score: Score,
    pub mv: Option<ChessMove>,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        key: 0,
        depth: 0,
        bound: Bound::None,
        score: VALUE_NONE,
        mv: None,
    };
}

pub struct TranspositionTable {
    slots: Vec<TTEntry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        TranspositionTable { slots: vec![TTEntry::EMPTY; TT_SIZE] }
    }

    #[inline]
    fn index(key: u64) -> usize {
        (key % TT_SIZE as u64) as usize
    }

    /// Returns the slot at `key mod TT_SIZE` unchanged. The caller recognizes a hit
    /// by comparing `entry.key == key`.
    #[inline]
    pub fn probe(&self, key: u64) -> TTEntry {
        self.slots[Self::index(key)]
    }

    pub fn store(
        &mut self,
        key: u64,
        depth: i32,
        bound: Bound,
        score: Score,
        mv: Option<ChessMove>,
        ply: i32,
    ) {
        let idx = Self::index(key);
        let e = &mut self.slots[idx];

        // Move replacement: refresh whenever identity changes or a different move was found.
        if e.key != key || e.mv != mv {
            e.mv = mv;
        }

        // Payload replacement: always on collision, always on an exact bound, otherwise
        // depth-preferred with a 4-ply hysteresis.
        if e.key != key || bound == Bound::Exact || depth + 4 > e.depth {
            e.depth = depth;
            e.score = score_to_tt(score, ply);
            e.key = key;
            e.bound = bound;
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(TTEntry::EMPTY);
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-anchors a mate score from "distance from this node" to "distance stored in the
/// entry", so it can be correctly re-read from a different ply later.
#[inline]
pub fn score_to_tt(s: Score, ply: i32) -> Score {
    if s >= VALUE_TB_WIN_IN_MAX_PLY {
        s + ply
    } else if s <= VALUE_TB_LOSS_IN_MAX_PLY {
        s - ply
    } else {
        s
    }
}

/// Inverse of [`score_to_tt`].
#[inline]
pub fn score_from_tt(s: Score, ply: i32) -> Score {
    if s >= VALUE_TB_WIN_IN_MAX_PLY {
        s - ply
    } else if s <= VALUE_TB_LOSS_IN_MAX_PLY {
        s + ply
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::VALUE_MATE;

    #[test]
    fn mate_score_round_trips_through_to_and_from() {
        for ply in 0..40 {
            for s in [VALUE_MATE - 1, VALUE_MATE - 10, -(VALUE_MATE - 1), -(VALUE_MATE - 10)] {
                let stored = score_to_tt(s, ply);
                assert_eq!(score_from_tt(stored, ply), s);
            }
        }
    }

    #[test]
    fn plain_score_is_unaffected_by_ply() {
        assert_eq!(score_to_tt(123, 7), 123);
        assert_eq!(score_from_tt(123, 7), 123);
    }

    #[test]
    fn store_then_probe_returns_same_payload() {
        let mut tt = TranspositionTable::new();
        let key = 0xDEAD_BEEFu64;
        tt.store(key, 6, Bound::Exact, 250, None, 2);
        let e = tt.probe(key);
        assert_eq!(e.key, key);
        assert_eq!(e.depth, 6);
        assert_eq!(e.bound, Bound::Exact);
        assert_eq!(score_from_tt(e.score, 2), 250);
    }

    #[test]
    fn shallower_entry_does_not_replace_deeper_one_on_same_key() {
        let mut tt = TranspositionTable::new();
        let key = 42u64;
        tt.store(key, 10, Bound::Upper, 10, None, 0);
        tt.store(key, 2, Bound::Upper, 20, None, 0);
        let e = tt.probe(key);
        assert_eq!(e.depth, 10);
    }

    #[test]
    fn exact_bound_always_replaces() {
        let mut tt = TranspositionTable::new();
        let key = 42u64;
        tt.store(key, 10, Bound::Upper, 10, None, 0);
        tt.store(key, 1, Bound::Exact, 20, None, 0);
        let e = tt.probe(key);
        assert_eq!(e.depth, 1);
        assert_eq!(e.bound, Bound::Exact);
    }

    #[test]
    fn empty_slot_reports_no_hit() {
        let tt = TranspositionTable::new();
        let e = tt.probe(99);
        assert_ne!(e.key, 99);
        assert_eq!(e.bound, Bound::None);
    }
}
