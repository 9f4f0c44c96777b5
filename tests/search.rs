//! Search behaviour on constructed positions.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use gambit::board::Board;
use gambit::move_generator::{is_legal, PromotionMode};
use gambit::moves::Move;
use gambit::parallel_search::ParallelSearch;
use gambit::search::{SearchStrategy, SerialSearch};
use gambit::transposition::{is_mate_score, Bound, TranspositionTable, IMMEDIATE_MATE_SCORE};

fn serial(fen: &str, depth: u32) -> (Board, gambit::search::SearchResult) {
    let board = Board::from_fen(fen).unwrap();
    let table = Mutex::new(TranspositionTable::new(1 << 15));
    let stop = AtomicBool::new(false);
    let result = SerialSearch::new(depth, PromotionMode::QueenAndKnight).run(&board, &table, &stop);
    (board, result)
}

#[test]
fn mate_in_one_through_pawn_support() {
    // Qg7 is covered by the f6 pawn
    let (board, result) = serial("6k1/5p1p/5PpQ/8/8/8/8/6RK w - - 0 1", 3);
    assert!(is_legal(&board, result.best_move));
    assert_eq!(result.best_move.to_uci(), "h6g7");
    assert_eq!(result.eval, IMMEDIATE_MATE_SCORE - 1);
}

#[test]
fn mated_side_reports_losing_mate_score() {
    // Kg8 is forced and Ra8 mates
    let (_, result) = serial("7k/R7/6K1/8/8/8/8/8 b - - 0 1", 4);
    assert_eq!(result.best_move.to_uci(), "h8g8");
    assert!(is_mate_score(result.eval));
    assert_eq!(result.eval, -(IMMEDIATE_MATE_SCORE - 2));
}

#[test]
fn stalemate_is_scored_as_draw() {
    let (_, terminal) = serial("k7/8/1Q6/8/8/8/8/6K1 b - - 0 1", 3);
    assert!(terminal.best_move.is_null());
    assert_eq!(terminal.eval, 0);

    // A queen up, white must not play Qb6
    let (_, result) = serial("k7/8/8/1Q6/8/8/8/6K1 w - - 0 1", 2);
    assert_ne!(result.best_move.to_uci(), "b5b6");
    assert!(result.eval > 500);
}

#[test]
fn promotion_is_preferred() {
    // The a7 rook takes the pawn unless it promotes at once
    let (_, result) = serial("8/r3P3/8/8/8/8/8/k3K3 w - - 0 1", 3);
    assert_eq!(result.best_move.to_uci(), "e7e8q");
    // Queen for rook, not a lost pawn
    assert!(result.eval > 200, "eval {}", result.eval);
}

#[test]
fn search_result_is_legal_in_every_test_position() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    ];
    for fen in fens {
        let (board, result) = serial(fen, 3);
        assert!(is_legal(&board, result.best_move), "{}: {}", fen, result.best_move);
        assert_eq!(result.depth, 3);
    }
}

#[test]
fn serial_and_parallel_agree_on_forced_win() {
    let fen = "4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1";
    let (_, serial_result) = serial(fen, 3);

    let board = Board::from_fen(fen).unwrap();
    let table = Mutex::new(TranspositionTable::new(1 << 15));
    let stop = AtomicBool::new(false);
    let parallel_result =
        ParallelSearch::new(3, PromotionMode::QueenAndKnight).run(&board, &table, &stop);

    assert_eq!(serial_result.best_move, parallel_result.best_move);
    assert_eq!(parallel_result.depth, 3);
}

#[test]
fn exact_entry_answers_shallower_probes() {
    let mut tt = TranspositionTable::default();
    let board = Board::start_position();
    let mv = Move::from_uci("e2e4", &board).unwrap();
    tt.store(board.zobrist_key, 6, 0, 25, Bound::Exact, mv);

    for depth in 0..=6 {
        assert_eq!(tt.lookup(board.zobrist_key, depth, 0, 0, 50), Some(25));
    }
    assert_eq!(tt.lookup(board.zobrist_key, 7, 0, 0, 50), None);
    assert_eq!(tt.stored_move(board.zobrist_key), mv);
}
