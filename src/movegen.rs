//! Move ordering: assigns a sort key to every legal move so the alpha-beta search
//! explores the most promising moves first (TT move, then captures by MVV-LVA, then
//! quiets by history), and a narrower capture-only variant for quiescence.

use crate::board::{BitBoard, Board, ChessMove, MoveGen, Piece};
use crate::history::HistoryTable;
use crate::pst::{mvv_lva_rank, piece_value, MVV_LVA};

const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_BASE_SCORE: i32 = 32_000;

/// The piece captured by `mv`, or `Pawn` if it's an en-passant capture (the
/// destination square is empty before the move in that case).
fn captured_piece(board: &Board, mv: ChessMove) -> Option<Piece> {
    if let Some(p) = board.piece_on(mv.get_dest()) {
        return Some(p);
    }
    let moving = board.piece_on(mv.get_source());
    if moving == Some(Piece::Pawn) && board.en_passant() == Some(mv.get_dest()) {
        Some(Piece::Pawn)
    } else {
        None
    }
}

/// True if `mv` captures a piece (regular capture or en passant).
pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    captured_piece(board, mv).is_some()
}

/// Material value of the piece `mv` captures, or a pawn's value if there is none
/// (used by quiescence delta pruning, which folds material into the evaluator's
/// own units regardless of whether a capture is legal at all).
pub fn captured_piece_value(board: &Board, mv: ChessMove) -> i32 {
    piece_value(captured_piece(board, mv).unwrap_or(Piece::Pawn))
}

/// All legal captures (regular captures plus en passant) in `board`.
pub fn legal_captures(board: &Board) -> Vec<ChessMove> {
    let mut mg = MoveGen::new_legal(board);
    let mut caps = Vec::new();

    let targets = board.color_combined(!board.side_to_move());
    mg.set_iterator_mask(targets);
    caps.extend(mg.by_ref());

    if let Some(ep) = board.en_passant() {
        mg.set_iterator_mask(BitBoard::from_square(ep));
        caps.extend(mg.by_ref());
    }

    caps
}

fn mvv_lva_score(board: &Board, mv: ChessMove) -> i32 {
    let attacker = board.piece_on(mv.get_source()).expect("move has no piece on source");
    let victim = captured_piece(board, mv).unwrap_or(Piece::Pawn);
    MVV_LVA[mvv_lva_rank(victim)][mvv_lva_rank(attacker)]
}

/// Full move-ordering key: TT move first, then captures by MVV-LVA, then quiets by history.
pub fn score_move(
    board: &Board,
    mv: ChessMove,
    tt_move: Option<ChessMove>,
    history: &HistoryTable,
) -> i32 {
    if Some(mv) == tt_move {
        return TT_MOVE_SCORE;
    }
    if is_capture(board, mv) {
        return CAPTURE_BASE_SCORE + mvv_lva_score(board, mv);
    }
    let stm = board.side_to_move();
    history.get(stm, mv.get_source().to_index(), mv.get_dest().to_index())
}

/// Sorts all legal moves descending by [`score_move`].
pub fn order_moves(
    board: &Board,
    moves: &mut [ChessMove],
    tt_move: Option<ChessMove>,
    history: &HistoryTable,
) {
    moves.sort_by_key(|&mv| std::cmp::Reverse(score_move(board, mv, tt_move, history)));
}

/// Sorts captures descending by MVV-LVA only (used by quiescence search).
pub fn order_captures(board: &Board, moves: &mut [ChessMove]) {
    moves.sort_by_key(|&mv| std::cmp::Reverse(mvv_lva_score(board, mv)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MoveGen;
    use std::str::FromStr;

    fn init() {
        crate::board::init();
    }

    #[test]
    fn tt_move_sorts_first() {
        init();
        let board = Board::default();
        let mut moves: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        let tt_move = moves[moves.len() - 1];
        let history = HistoryTable::new();
        order_moves(&board, &mut moves, Some(tt_move), &history);
        assert_eq!(moves[0], tt_move);
    }

    #[test]
    fn capture_outranks_quiet_move() {
        init();
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let board = Board::from_str(fen).unwrap();
        let moves: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        let history = HistoryTable::new();
        let mut scored: Vec<(ChessMove, i32)> = moves
            .iter()
            .map(|&m| (m, score_move(&board, m, None, &history)))
            .collect();
        scored.sort_by_key(|&(_, s)| std::cmp::Reverse(s));
        // There is exactly one capture available here (pawn takes pawn, e4xd5 equivalent is absent
        // at this point, but exd5 via discovered capture-free position is not guaranteed, so just
        // check any capture present outranks any non-capture).
        let best_quiet = scored.iter().find(|(m, _)| !is_capture(&board, *m));
        let best_capture = scored.iter().find(|(m, _)| is_capture(&board, *m));
        if let (Some((_, cap_score)), Some((_, quiet_score))) = (best_capture, best_quiet) {
            assert!(cap_score > quiet_score);
        }
    }

    #[test]
    fn en_passant_capture_is_detected() {
        init();
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 1";
        let board = Board::from_str(fen).unwrap();
        let e5 = crate::board::Square::new(36);
        let d6 = crate::board::Square::new(43);
        let mv = ChessMove::new(e5, d6, None);
        assert!(is_capture(&board, mv));
    }
}
