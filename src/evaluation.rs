//! Static evaluation: material + classic piece-square tables, side-to-move relative.

use crate::board::{Board, Color, Piece};
use crate::pst;
use crate::score::Score;

/// Evaluate `board` from the perspective of the side to move: positive favors the
/// side whose turn it is. Computed as `eval_side(stm) - eval_side(!stm)` directly,
/// rather than the more common "white minus black, negate for Black" form.
pub fn evaluate(board: &Board) -> Score {
    eval_side(board, board.side_to_move()) - eval_side(board, !board.side_to_move())
}

fn eval_side(board: &Board, color: Color) -> Score {
    let mut score: Score = 0;
    let ours = board.color_combined(color);
    for piece in Piece::ALL {
        let bb = board.pieces(piece) & ours;
        for sq in bb.iter() {
            score += pst::piece_value(piece);
            score += pst::psqt_value(piece, color, sq.to_index());
        }
    }
    score
}
