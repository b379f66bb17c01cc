//! Negamax alpha-beta search with quiescence, transposition table, mate-distance
//! pruning, null-move pruning, and iterative deepening.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::board::{Board, ChessMove, MoveGen};
use crate::evaluation::evaluate;
use crate::history::HistoryTable;
use crate::limits::{Limits, TimeCheck};
use crate::movegen::{is_capture, legal_captures, order_captures, order_moves};
use crate::repetition::HashHistory;
use crate::score::{
    mate_in, mated_in, Score, MAX_PLY, VALUE_INFINITE, VALUE_MATE, VALUE_MATE_IN_PLY,
    VALUE_TB_WIN_IN_MAX_PLY,
};
use crate::tt::{score_from_tt, Bound, TranspositionTable};

/// Padded by one row/column beyond MAX_PLY so a cutoff at the deepest legal ply
/// never indexes the triangular PV table out of bounds.
const PV_ROWS: usize = MAX_PLY + 1;

pub struct SearchResult {
    pub best_move: Option<ChessMove>,
    pub score: Score,
    pub depth: u32,
    pub nodes: u64,
}

pub struct SearchState {
    pub tt: TranspositionTable,
    pub history: HistoryTable,
    pub hash_history: HashHistory,
    pv_table: [[Option<ChessMove>; PV_ROWS]; PV_ROWS],
    pv_length: [usize; PV_ROWS],
    nodes: u64,
    time_check: TimeCheck,
    limits: Limits,
    /// Suppresses `info`/`bestmove` output; used by tests and benchmarks driving the
    /// search directly instead of through the UCI dispatcher.
    pub silent: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self::with_stop_flag(Arc::new(AtomicBool::new(false)))
    }

    pub fn with_stop_flag(stop: Arc<AtomicBool>) -> Self {
        SearchState {
            tt: TranspositionTable::new(),
            history: HistoryTable::new(),
            hash_history: HashHistory::new(),
            pv_table: [[None; PV_ROWS]; PV_ROWS],
            pv_length: [0; PV_ROWS],
            nodes: 0,
            time_check: TimeCheck::new(stop),
            limits: Limits::default(),
            silent: false,
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.time_check.stop_flag()
    }

    pub fn request_stop(&self) {
        self.time_check.request_stop();
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Clears PV length, node counter, start time, stop flag, throttle counter, hash
    /// history, and the history table. Does NOT clear the TT.
    pub fn reset(&mut self) {
        self.pv_length = [0; PV_ROWS];
        self.nodes = 0;
        self.time_check.restart();
        self.time_check.clear_stop();
        self.hash_history.clear();
        self.history.clear();
    }

    /// `ucinewgame`-only reset: clears per-game heuristics and the TT.
    pub fn new_game(&mut self) {
        self.reset();
        self.tt.clear();
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    fn update_pv(&mut self, ply: usize, mv: ChessMove) {
        self.pv_table[ply][ply] = Some(mv);
        let next_len = self.pv_length[ply + 1];
        for i in (ply + 1)..next_len {
            self.pv_table[ply][i] = self.pv_table[ply + 1][i];
        }
        self.pv_length[ply] = next_len;
    }

    fn pv_line(&self) -> Vec<ChessMove> {
        self.pv_table[0][0..self.pv_length[0]].iter().filter_map(|m| *m).collect()
    }

    pub fn iterative_deepening(&mut self, root: Board) -> SearchResult {
        self.nodes = 0;
        self.time_check.restart();

        let target_depth = self.limits.depth.min(MAX_PLY as u32).max(1);
        let mut best_move = None;
        let mut best_score: Score = 0;
        let mut completed_depth = 0u32;

        for d in 1..=target_depth {
            let score = self.absearch(root, -VALUE_INFINITE, VALUE_INFINITE, d as i32, 0);

            if self.time_check.check_time(true, self.nodes, &self.limits) {
                break;
            }

            best_move = self.pv_table[0][0];
            best_score = score;
            completed_depth = d;

            if !self.silent {
                self.emit_info(d, score);
            }
        }

        if best_move.is_none() {
            best_move = self.pv_table[0][0];
        }

        if !self.silent {
            println!("bestmove {}", format_move(best_move));
        }

        SearchResult { best_move, score: best_score, depth: completed_depth, nodes: self.nodes }
    }

    fn emit_info(&self, depth: u32, score: Score) {
        let elapsed_ms = self.time_check.elapsed_ms();
        let nps = self.nodes / (elapsed_ms / 1000).max(1);
        let pv: Vec<String> = self.pv_line().iter().map(|m| m.to_string()).collect();
        println!(
            "info depth {} score {} nodes {} nps {} time {} pv {}",
            depth,
            format_score(score),
            self.nodes,
            nps,
            elapsed_ms,
            pv.join(" ")
        );
    }

    fn absearch(&mut self, board: Board, mut alpha: Score, mut beta: Score, depth: i32, ply: i32) -> Score {
        let limits = self.limits;

        if self.time_check.check_time(false, self.nodes, &limits) {
            return 0;
        }
        if ply as usize >= MAX_PLY {
            return evaluate(&board);
        }

        self.pv_length[ply as usize] = ply as usize;
        let root_node = ply == 0;
        let hash_key = board.get_hash();

        if !root_node {
            if self.hash_history.is_repetition(hash_key, board.halfmove_clock() as u32, 1) {
                return -5;
            }
            if board.halfmove_clock() >= 100 {
                return 0;
            }
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply + 1));
            if alpha >= beta {
                return alpha;
            }
        }

        if depth <= 0 {
            return self.qsearch(board, alpha, beta, ply);
        }

        let entry = self.tt.probe(hash_key);
        let tt_hit = entry.key == hash_key;
        let tt_move = if tt_hit { entry.mv } else { None };
        if !root_node && tt_hit && entry.depth >= depth {
            let tt_score = score_from_tt(entry.score, ply);
            match entry.bound {
                Bound::Lower => alpha = alpha.max(tt_score),
                Bound::Upper => beta = beta.min(tt_score),
                _ => {}
            }
            if alpha >= beta {
                return tt_score;
            }
        }

        if depth >= 3 && board.checkers().is_empty() {
            if let Some(null_board) = board.null_move() {
                self.hash_history.push(null_board.get_hash());
                let score = -self.absearch(null_board, -beta, -beta + 1, depth - 2, ply + 1);
                self.hash_history.pop();
                if score >= beta {
                    let clamped = if score >= VALUE_TB_WIN_IN_MAX_PLY { beta } else { score };
                    return clamped;
                }
            }
        }

        let old_alpha = alpha;
        let mut best_score = -VALUE_INFINITE;
        let mut best_move: Option<ChessMove> = None;
        let mut made_moves = 0u32;

        let mut moves: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        order_moves(&board, &mut moves, tt_move, &self.history);

        for mv in moves {
            made_moves += 1;
            self.nodes += 1;

            let new_board = board.make_move_new(mv);
            self.hash_history.push(new_board.get_hash());
            let score = -self.absearch(new_board, -beta, -alpha, depth - 1, ply + 1);
            self.hash_history.pop();

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                self.update_pv(ply as usize, mv);

                if score > alpha {
                    alpha = score;
                    if score >= beta {
                        if !is_capture(&board, mv) {
                            self.history.update(
                                board.side_to_move(),
                                mv.get_source().to_index(),
                                mv.get_dest().to_index(),
                                depth,
                            );
                        }
                        break;
                    }
                }
            }
        }

        if made_moves == 0 {
            return if board.checkers().is_empty() { 0 } else { mated_in(ply) };
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if alpha != old_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };

        if !self.time_check.is_stopped() && !(limits.nodes != 0 && self.nodes >= limits.nodes) {
            self.tt.store(hash_key, depth, bound, best_score, best_move, ply);
        }

        best_score
    }

    fn qsearch(&mut self, board: Board, mut alpha: Score, beta: Score, ply: i32) -> Score {
        if self.time_check.check_time(false, self.nodes, &self.limits) {
            return 0;
        }
        if ply as usize >= MAX_PLY {
            return evaluate(&board);
        }

        let mut best = evaluate(&board);
        if best >= beta {
            return best;
        }
        if best > alpha {
            alpha = best;
        }

        let mut captures = legal_captures(&board);
        order_captures(&board, &mut captures);

        for mv in captures {
            self.nodes += 1;

            let captured_value = crate::movegen::captured_piece_value(&board, mv);
            if captured_value + 400 + best < alpha && mv.get_promotion().is_none() {
                continue;
            }

            let new_board = board.make_move_new(mv);
            let score = -self.qsearch(new_board, -beta, -alpha, ply + 1);

            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                }
                if score >= beta {
                    break;
                }
            }
        }

        best
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a score as `cp S` or `mate M` per the UCI-style progress line.
pub fn format_score(score: Score) -> String {
    if score >= VALUE_MATE_IN_PLY {
        let diff = VALUE_MATE - score;
        let m = diff / 2 + (diff & 1);
        format!("mate {}", m)
    } else if score <= -VALUE_MATE_IN_PLY {
        let diff = VALUE_MATE + score;
        let m = -(diff / 2) + (diff & 1);
        format!("mate {}", m)
    } else {
        format!("cp {}", score)
    }
}

fn format_move(mv: Option<ChessMove>) -> String {
    match mv {
        Some(m) => m.to_string(),
        None => "0000".to_string(),
    }
}

/// One-shot search to a fixed depth with no time/node limit. Convenience wrapper used
/// by tests and benchmarks; the UCI dispatcher instead calls
/// [`SearchState::set_limits`] followed by [`SearchState::iterative_deepening`].
pub fn search(board: &Board, state: &mut SearchState, depth: u32) -> SearchResult {
    state.set_limits(Limits { time_ms: 0, depth, nodes: 0 });
    state.iterative_deepening(*board)
}
