//! Gambit - Perft Module
//!
//! Leaf-node counting over the legal move tree. Exercises move generation
//! and make/unmake together; any mismatch against published counts points
//! at a bug in one of them.

use crate::board::Board;
use crate::move_generator::MoveGenerator;
use crate::moves::Move;

/// Count leaf nodes `depth` plies below the current position
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    let mut generator = MoveGenerator::new();
    perft_with(board, &mut generator, depth)
}

fn perft_with(board: &mut Board, generator: &mut MoveGenerator, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generator.generate_moves(board, false);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in moves {
        board.make_move(mv, true);
        nodes += perft_with(board, generator, depth - 1);
        board.unmake_move(mv, true);
    }
    nodes
}

/// Per-root-move node counts, in generation order
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    let mut generator = MoveGenerator::new();
    let moves = generator.generate_moves(board, false);

    moves
        .into_iter()
        .map(|mv| {
            board.make_move(mv, true);
            let nodes = if depth <= 1 {
                1
            } else {
                perft_with(board, &mut generator, depth - 1)
            };
            board.unmake_move(mv, true);
            (mv, nodes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divide_sums_to_perft() {
        let mut board = Board::start_position();
        let divide = perft_divide(&mut board, 2);
        assert_eq!(divide.len(), 20);
        assert!(divide.iter().all(|&(_, n)| n == 20));
        assert_eq!(divide.iter().map(|&(_, n)| n).sum::<u64>(), perft(&mut board, 2));
    }

    #[test]
    fn test_perft_leaves_board_unchanged() {
        let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut board = Board::from_fen(kiwipete).unwrap();
        let key = board.zobrist_key;
        assert_eq!(perft(&mut board, 2), 2039);
        assert_eq!(board.zobrist_key, key);
    }
}
