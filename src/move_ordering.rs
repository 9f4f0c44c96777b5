//! Gambit - Move Ordering Module
//!
//! Cheap heuristic scores that put likely cutoff moves first:
//! valuable victims taken by cheap attackers, promotions, and the hash move.

use crate::board::Board;
use crate::evaluation::PIECE_VALUES;
use crate::moves::{Move, FLAG_EN_PASSANT};
use crate::types::*;

const HASH_MOVE_BONUS: i32 = 10_000;
const SQUARE_CONTROLLED_BY_OPPONENT_PAWN_PENALTY: i32 = 350;
const CAPTURED_PIECE_VALUE_MULTIPLIER: i32 = 10;

#[derive(Clone, Debug, Default)]
pub struct MoveOrdering {
    scored: Vec<(i32, Move)>,
}

impl MoveOrdering {
    pub fn new() -> Self {
        MoveOrdering {
            scored: Vec::with_capacity(218),
        }
    }

    /// Sort `moves` best-first. `opponent_pawn_attacks` comes from the
    /// generator call that produced the list.
    pub fn order_moves(
        &mut self,
        hash_move: Move,
        board: &Board,
        moves: &mut [Move],
        opponent_pawn_attacks: u64,
    ) {
        self.scored.clear();
        self.scored.extend(
            moves
                .iter()
                .map(|&mv| (score_move(mv, hash_move, board, opponent_pawn_attacks), mv)),
        );

        // Stable, so equal scores keep generation order
        self.scored.sort_by(|a, b| b.0.cmp(&a.0));

        for (slot, &(_, mv)) in moves.iter_mut().zip(self.scored.iter()) {
            *slot = mv;
        }
    }
}

pub fn score_move(mv: Move, hash_move: Move, board: &Board, opponent_pawn_attacks: u64) -> i32 {
    let mut score = 0;
    let move_piece_type = piece_type(board.squares[mv.start()]);
    let capture_piece_type = if mv.flag() == FLAG_EN_PASSANT {
        PAWN
    } else {
        piece_type(board.squares[mv.target()])
    };

    if capture_piece_type != EMPTY {
        // Even QxP ranks above quiet moves
        score = CAPTURED_PIECE_VALUE_MULTIPLIER * PIECE_VALUES[capture_piece_type as usize]
            - PIECE_VALUES[move_piece_type as usize];
    }

    if move_piece_type == PAWN {
        score += PIECE_VALUES[mv.promotion_piece_type() as usize];
    } else if capture_piece_type == EMPTY && opponent_pawn_attacks & (1u64 << mv.target()) != 0 {
        score -= SQUARE_CONTROLLED_BY_OPPONENT_PAWN_PENALTY;
    }

    if mv == hash_move {
        score += HASH_MOVE_BONUS;
    }

    score
}
