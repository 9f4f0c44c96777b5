//! Random-walk checks of make/unmake and incremental hashing.

use rand::prelude::*;

use gambit::board::Board;
use gambit::move_generator::MoveGenerator;
use gambit::zobrist;

const FENS: [&str; 4] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

/// Everything make/unmake must restore
fn snapshot(board: &Board) -> (Vec<u8>, Vec<Vec<usize>>, [usize; 2], u32, u64, u32, bool) {
    let mut lists = Vec::new();
    for c in 0..2 {
        let lists_of_colour = [
            &board.pawns[c],
            &board.knights[c],
            &board.bishops[c],
            &board.rooks[c],
            &board.queens[c],
        ];
        for list in lists_of_colour {
            let mut squares = list.squares().to_vec();
            squares.sort_unstable();
            lists.push(squares);
        }
    }
    (
        board.squares.to_vec(),
        lists,
        board.king_squares,
        board.fifty_move_counter,
        board.zobrist_key,
        board.ply_count,
        board.white_to_move,
    )
}

#[test]
fn make_unmake_restores_every_position_on_random_walks() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut generator = MoveGenerator::new();

    for fen in FENS {
        let mut board = Board::from_fen(fen).unwrap();
        let mut played = Vec::new();

        for _ in 0..60 {
            let moves = generator.generate_moves(&board, false);
            let Some(&mv) = moves.choose(&mut rng) else { break };

            // Each legal move in this position undoes cleanly
            let before = snapshot(&board);
            let state = board.current_state;
            for &probe in &moves {
                board.make_move(probe, true);
                board.unmake_move(probe, true);
                assert_eq!(snapshot(&board), before, "{} after {}", fen, probe);
                assert_eq!(board.current_state, state);
            }

            board.make_move(mv, false);
            played.push((mv, before));
        }

        // Unwinding the whole game returns to the start
        while let Some((mv, before)) = played.pop() {
            board.unmake_move(mv, false);
            assert_eq!(snapshot(&board), before);
        }
    }
}

#[test]
fn incremental_key_matches_recomputation() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut generator = MoveGenerator::new();

    for fen in FENS {
        let mut board = Board::from_fen(fen).unwrap();
        assert_eq!(board.zobrist_key, zobrist::calculate(&board));

        for _ in 0..80 {
            let moves = generator.generate_moves(&board, false);
            let Some(&mv) = moves.choose(&mut rng) else { break };
            board.make_move(mv, true);
            assert_eq!(board.zobrist_key, zobrist::calculate(&board), "{} after {}", fen, mv);
        }
    }
}
