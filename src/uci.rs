//! UCI command dispatcher: reads stdin lines, maintains the current position, and
//! runs the search on a worker thread coordinated through a shared stop flag.

use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::board::{Board, ChessMove, Color, File, Piece, Rank, Square};
use crate::limits::Limits;
use crate::repetition::HashHistory;
use crate::search::{self, SearchState};

const DEFAULT_DEPTH: u32 = 64;

pub fn run() {
    let stdin = io::stdin();

    let mut board = Board::default();
    let mut search_state: Option<SearchState> = Some(SearchState::new());
    let mut stop_flag: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    let mut search_thread: Option<thread::JoinHandle<SearchState>> = None;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        match tokens[0] {
            "uci" => {
                println!("id name corvid");
                println!("id author yourname");
                println!("option name Hash type spin default 64 min 1 max 4096");
                println!("uciok");
            }
            "isready" => {
                wait_for_search(&mut search_thread, &mut search_state);
                println!("readyok");
            }
            "ucinewgame" => {
                wait_for_search(&mut search_thread, &mut search_state);
                board = Board::default();
                if let Some(ref mut ss) = search_state {
                    ss.new_game();
                }
            }
            "position" => {
                wait_for_search(&mut search_thread, &mut search_state);
                if let Some(ref mut ss) = search_state {
                    parse_position(&tokens, &mut board, &mut ss.hash_history);
                }
            }
            "go" => {
                wait_for_search(&mut search_thread, &mut search_state);

                let go_params = parse_go(&tokens);
                let depth = go_params.depth.unwrap_or(DEFAULT_DEPTH);
                let time_ms = go_params.compute_time_ms(board.side_to_move());

                let mut ss = search_state.take().expect("search state missing");
                ss.reset();
                ss.set_limits(Limits { time_ms, depth, nodes: 0 });

                let flag = Arc::new(AtomicBool::new(false));
                stop_flag = flag.clone();
                ss = take_stop_flag(ss, flag);

                let board_copy = board;

                search_thread = Some(thread::spawn(move || {
                    let _ = search::search(&board_copy, &mut ss, depth);
                    ss
                }));
            }
            "stop" => {
                stop_flag.store(true, Ordering::SeqCst);
                wait_for_search(&mut search_thread, &mut search_state);
            }
            "setoption" => {
                wait_for_search(&mut search_thread, &mut search_state);
                // `Hash` is accepted for UCI conformance but is a no-op: the
                // transposition table is a fixed-size direct-mapped design, not a
                // tunable. No other options are recognized.
            }
            "quit" => {
                stop_flag.store(true, Ordering::SeqCst);
                wait_for_search(&mut search_thread, &mut search_state);
                break;
            }
            "d" | "print" => {
                println!("{}", board);
            }
            _ => {}
        }
    }
}

/// Rebuilds a `SearchState` carrying a caller-supplied stop flag, preserving its TT,
/// history table, and hash history. `SearchState` has no setter for the stop flag
/// alone (it is write-only from the dispatcher's point of view via `request_stop`),
/// so a fresh state sharing the new flag is constructed and the reusable heuristics
/// state is moved across.
fn take_stop_flag(ss: SearchState, flag: Arc<AtomicBool>) -> SearchState {
    let mut fresh = SearchState::with_stop_flag(flag);
    fresh.tt = ss.tt;
    fresh.history = ss.history;
    fresh.hash_history = ss.hash_history;
    fresh.silent = ss.silent;
    fresh
}

/// Wait for a running search thread to finish and recover the `SearchState`.
fn wait_for_search(
    handle: &mut Option<thread::JoinHandle<SearchState>>,
    state: &mut Option<SearchState>,
) {
    if let Some(h) = handle.take() {
        match h.join() {
            Ok(ss) => *state = Some(ss),
            Err(_) => {
                *state = Some(SearchState::new());
            }
        }
    }
}

/// Parsed `go` command parameters.
struct GoParams {
    depth: Option<u32>,
    movetime: Option<u64>,
    wtime: Option<u64>,
    btime: Option<u64>,
    winc: Option<u64>,
    binc: Option<u64>,
    moves_to_go: Option<u64>,
    infinite: bool,
}

impl GoParams {
    fn new() -> Self {
        Self {
            depth: None,
            movetime: None,
            wtime: None,
            btime: None,
            winc: None,
            binc: None,
            moves_to_go: None,
            infinite: false,
        }
    }

    /// Computes the time limit for this search in milliseconds. `0` means unlimited
    /// (depth-limited), matching `Limits::time_ms`'s convention.
    fn compute_time_ms(&self, side: Color) -> u64 {
        if self.infinite {
            return 0;
        }
        if let Some(mt) = self.movetime {
            return mt;
        }

        let (my_time, my_inc) = if side == Color::White {
            (self.wtime.unwrap_or(0), self.winc.unwrap_or(0))
        } else {
            (self.btime.unwrap_or(0), self.binc.unwrap_or(0))
        };

        if my_time == 0 {
            return 0;
        }

        let moves_left = self.moves_to_go.unwrap_or(30);
        let base = my_time / moves_left.max(1);
        let inc_bonus = my_inc * 3 / 4;
        let allocated = base + inc_bonus;

        allocated.min(my_time * 4 / 5)
    }
}

fn parse_go(tokens: &[&str]) -> GoParams {
    let mut params = GoParams::new();
    let mut i = 1;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                if i < tokens.len() {
                    params.depth = tokens[i].parse().ok();
                }
            }
            "movetime" => {
                i += 1;
                if i < tokens.len() {
                    params.movetime = tokens[i].parse().ok();
                }
            }
            "wtime" => {
                i += 1;
                if i < tokens.len() {
                    params.wtime = tokens[i].parse().ok();
                }
            }
            "btime" => {
                i += 1;
                if i < tokens.len() {
                    params.btime = tokens[i].parse().ok();
                }
            }
            "winc" => {
                i += 1;
                if i < tokens.len() {
                    params.winc = tokens[i].parse().ok();
                }
            }
            "binc" => {
                i += 1;
                if i < tokens.len() {
                    params.binc = tokens[i].parse().ok();
                }
            }
            "movestogo" => {
                i += 1;
                if i < tokens.len() {
                    params.moves_to_go = tokens[i].parse().ok();
                }
            }
            "infinite" => {
                params.infinite = true;
            }
            _ => {}
        }
        i += 1;
    }

    params
}

fn parse_position(tokens: &[&str], board: &mut Board, hash_history: &mut HashHistory) {
    if tokens.len() < 2 {
        return;
    }

    let mut idx = 1;

    if tokens[idx] == "startpos" {
        *board = Board::default();
        idx += 1;
    } else if tokens[idx] == "fen" {
        idx += 1;
        let mut fen_parts: Vec<&str> = Vec::new();
        while idx < tokens.len() && tokens[idx] != "moves" && fen_parts.len() < 6 {
            fen_parts.push(tokens[idx]);
            idx += 1;
        }
        if fen_parts.len() >= 4 {
            let fen_str = fen_parts.join(" ");
            match Board::from_str(&fen_str) {
                Ok(b) => *board = b,
                Err(_) => return,
            }
        } else {
            return;
        }
    } else {
        return;
    }

    hash_history.clear();
    hash_history.push(board.get_hash());

    if idx < tokens.len() && tokens[idx] == "moves" {
        idx += 1;
        for &move_str in &tokens[idx..] {
            if let Some(m) = parse_uci_move(board, move_str) {
                *board = board.make_move_new(m);
                hash_history.push(board.get_hash());
            }
        }
    }
}

/// Parses a UCI move string directly into squares + optional promotion piece.
fn parse_uci_move(board: &Board, move_str: &str) -> Option<ChessMove> {
    if move_str.len() < 4 {
        return None;
    }
    let bytes = move_str.as_bytes();

    let src_file = bytes[0].wrapping_sub(b'a');
    let src_rank = bytes[1].wrapping_sub(b'1');
    let dst_file = bytes[2].wrapping_sub(b'a');
    let dst_rank = bytes[3].wrapping_sub(b'1');

    if src_file >= 8 || src_rank >= 8 || dst_file >= 8 || dst_rank >= 8 {
        return None;
    }

    let src = Square::make_square(
        Rank::from_index(src_rank as usize),
        File::from_index(src_file as usize),
    );
    let dst = Square::make_square(
        Rank::from_index(dst_rank as usize),
        File::from_index(dst_file as usize),
    );

    let promo = if move_str.len() >= 5 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let mv = ChessMove::new(src, dst, promo);
    if board.legal(mv) {
        Some(mv)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_startpos() {
        let mut board = Board::default();
        let mut history = HashHistory::new();
        let tokens = vec!["position", "startpos"];
        parse_position(&tokens, &mut board, &mut history);
        assert_eq!(board, Board::default());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        crate::board::init();
        let mut board = Board::default();
        let mut history = HashHistory::new();
        let tokens = vec!["position", "startpos", "moves", "e2e4", "e7e5"];
        parse_position(&tokens, &mut board, &mut history);
        assert_ne!(board, Board::default());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn parse_position_fen() {
        crate::board::init();
        let mut board = Board::default();
        let mut history = HashHistory::new();
        let tokens = vec![
            "position", "fen",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR",
            "b", "KQkq", "e3", "0", "1",
        ];
        parse_position(&tokens, &mut board, &mut history);
        assert_ne!(board, Board::default());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn parse_go_depth() {
        let tokens = vec!["go", "depth", "6"];
        let params = parse_go(&tokens);
        assert_eq!(params.depth, Some(6));
    }

    #[test]
    fn parse_go_time() {
        let tokens = vec!["go", "wtime", "60000", "btime", "60000", "winc", "1000", "binc", "1000"];
        let params = parse_go(&tokens);
        assert_eq!(params.wtime, Some(60000));
        assert_eq!(params.btime, Some(60000));
        assert_eq!(params.winc, Some(1000));
        assert_eq!(params.binc, Some(1000));
    }

    #[test]
    fn compute_time_ms_stays_within_cap() {
        let mut params = GoParams::new();
        params.wtime = Some(60000);
        params.winc = Some(1000);
        let time = params.compute_time_ms(Color::White);
        assert!(time > 0 && time <= 48000, "time allocation {} out of range", time);
    }

    #[test]
    fn parse_uci_move_basic() {
        crate::board::init();
        let board = Board::default();
        let mv = parse_uci_move(&board, "e2e4");
        assert!(mv.is_some(), "e2e4 should be a legal move from startpos");
    }

    #[test]
    fn parse_uci_move_invalid() {
        crate::board::init();
        let board = Board::default();
        let mv = parse_uci_move(&board, "e2e5");
        assert!(mv.is_none(), "e2e5 should not be legal from startpos");
    }

    #[test]
    fn parse_uci_move_promotion() {
        crate::board::init();
        let board = Board::from_str("8/P7/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let mv = parse_uci_move(&board, "a7a8q");
        assert!(mv.is_some(), "a7a8q should be a legal promotion");
        assert_eq!(mv.unwrap().get_promotion(), Some(Piece::Queen));
    }

    #[test]
    fn position_history_tracks_repetition() {
        crate::board::init();
        let mut board = Board::default();
        let mut history = HashHistory::new();
        let tokens = vec!["position", "startpos", "moves", "g1f3", "g8f6", "f3g1", "f6g8"];
        parse_position(&tokens, &mut board, &mut history);
        assert_eq!(history.len(), 5);
    }
}
