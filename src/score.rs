//! Score constants and mate-distance helpers.
//!
//! Values and helper shapes are taken from the original search core this engine
//! reimplements rather than invented: `VALUE_MATE`/`VALUE_INFINITE` sit just above the
//! largest plausible evaluation so mate scores always dominate material, and
//! `MAX_PLY` bounds every array sized per-ply (PV table, hash history lookups).

/// Search score, in centipawns (or a mate-distance encoding above VALUE_MATE_IN_PLY).
pub type Score = i32;

pub const VALUE_INFINITE: Score = 32_001;
pub const VALUE_NONE: Score = 32_002;
pub const VALUE_MATE: Score = 32_000;

/// Maximum search ply. Bounds the PV table, killer/history indexing, and hash history walks.
pub const MAX_PLY: usize = 60;

/// Node-count throttle for the time check: only call checkTime every CHECK_RATE nodes.
pub const CHECK_RATE: u64 = 256;

pub const VALUE_MATE_IN_PLY: Score = VALUE_MATE - MAX_PLY as Score;
pub const VALUE_MATED_IN_PLY: Score = -VALUE_MATE_IN_PLY;

/// Syzygy-style win/loss thresholds, retained even without tablebase support since
/// the TT's mate-distance adjustment (scoreToTT/scoreFromTT) is written against them.
pub const VALUE_TB_WIN_IN_MAX_PLY: Score = VALUE_MATE_IN_PLY - MAX_PLY as Score;
pub const VALUE_TB_LOSS_IN_MAX_PLY: Score = -VALUE_TB_WIN_IN_MAX_PLY;

/// Score representing "mate in `ply` plies" from the side to move's perspective.
#[inline]
pub fn mate_in(ply: i32) -> Score {
    VALUE_MATE - ply
}

/// Score representing "mated in `ply` plies" from the side to move's perspective.
#[inline]
pub fn mated_in(ply: i32) -> Score {
    -VALUE_MATE + ply
}

/// True if `score` represents a forced mate for either side within the search horizon.
#[inline]
pub fn is_mate_score(score: Score) -> bool {
    score.abs() >= VALUE_MATE_IN_PLY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_original() {
        assert_eq!(VALUE_INFINITE, 32_001);
        assert_eq!(VALUE_NONE, 32_002);
        assert_eq!(VALUE_MATE, 32_000);
        assert_eq!(MAX_PLY, 60);
        assert_eq!(CHECK_RATE, 256);
        assert_eq!(VALUE_MATE_IN_PLY, 31_940);
        assert_eq!(VALUE_TB_WIN_IN_MAX_PLY, 31_880);
        assert_eq!(VALUE_TB_LOSS_IN_MAX_PLY, -31_880);
    }

    #[test]
    fn mate_in_decreases_with_ply() {
        assert!(mate_in(1) > mate_in(3));
        assert!(is_mate_score(mate_in(1)));
        assert!(is_mate_score(mated_in(1)));
        assert!(!is_mate_score(500));
    }
}
