//! Gambit - Position Evaluation Module
//!
//! Static evaluation from the side to move's point of view:
//! - Material
//! - Piece-square tables, with pawn and king tables blended by game phase
//! - Mop-up bonus that herds a losing king to the edge in won endgames

use crate::bitboard::{orthogonal_distance, CENTRE_MANHATTAN_DISTANCE};
use crate::board::Board;
use crate::types::*;

// ============================================================================
// PIECE VALUES
// ============================================================================

pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 300;
pub const BISHOP_VALUE: i32 = 320;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Indexed by piece type
pub const PIECE_VALUES: [i32; 7] =
    [0, PAWN_VALUE, KNIGHT_VALUE, BISHOP_VALUE, ROOK_VALUE, QUEEN_VALUE, 0];

/// Non-pawn material at or below which the endgame weight reaches 1
const ENDGAME_MATERIAL_START: f32 = (ROOK_VALUE * 2 + BISHOP_VALUE + KNIGHT_VALUE) as f32;

// ============================================================================
// PIECE-SQUARE TABLES (white's view, index 0 = a1)
// ============================================================================

const PAWN_START_PST: [i32; 64] = [
    0,   0,   0,   0,   0,   0,   0,   0,
    5,  10,  10, -20, -20,  10,  10,   5,
    5,  -5, -10,   0,   0, -10,  -5,   5,
    0,   0,   0,  20,  20,   0,   0,   0,
    5,   5,  10,  25,  25,  10,   5,   5,
   10,  10,  20,  30,  30,  20,  10,  10,
   50,  50,  50,  50,  50,  50,  50,  50,
    0,   0,   0,   0,   0,   0,   0,   0,
];

const PAWN_END_PST: [i32; 64] = [
    0,   0,   0,   0,   0,   0,   0,   0,
   10,  10,  10,  10,  10,  10,  10,  10,
   10,  10,  10,  10,  10,  10,  10,  10,
   20,  20,  20,  20,  20,  20,  20,  20,
   30,  30,  30,  30,  30,  30,  30,  30,
   50,  50,  50,  50,  50,  50,  50,  50,
   80,  80,  80,  80,  80,  80,  80,  80,
    0,   0,   0,   0,   0,   0,   0,   0,
];

const KNIGHT_PST: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

const BISHOP_PST: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

const ROOK_PST: [i32; 64] = [
    0,   0,   0,   5,   5,   0,   0,   0,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
    5,  10,  10,  10,  10,  10,  10,   5,
    0,   0,   0,   0,   0,   0,   0,   0,
];

const QUEEN_PST: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   5,   0,   0,   0,   0, -10,
   -10,   5,   5,   5,   5,   5,   0, -10,
     0,   0,   5,   5,   5,   5,   0,  -5,
    -5,   0,   5,   5,   5,   5,   0,  -5,
   -10,   0,   5,   5,   5,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

const KING_START_PST: [i32; 64] = [
    20,  30,  10,   0,   0,  10,  30,  20,
    20,  20,   0,   0,   0,   0,  20,  20,
   -10, -20, -20, -20, -20, -20, -20, -10,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
];

const KING_END_PST: [i32; 64] = [
   -50, -30, -30, -30, -30, -30, -30, -50,
   -30, -30,   0,   0,   0,   0, -30, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -20, -10,   0,   0, -10, -20, -30,
   -50, -40, -30, -20, -20, -30, -40, -50,
];

/// Table lookup with black's squares mirrored vertically
#[inline]
fn read_pst(table: &[i32; 64], sq: usize, is_white: bool) -> i32 {
    if is_white {
        table[sq]
    } else {
        table[square_at(file_of(sq), 7 - rank_of(sq))]
    }
}

fn sum_pst(table: &[i32; 64], squares: &[usize], is_white: bool) -> i32 {
    squares.iter().map(|&sq| read_pst(table, sq, is_white)).sum()
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluate the position. Positive scores favour the side to move.
pub fn evaluate(board: &Board) -> i32 {
    let white_material = count_material(board, WHITE_INDEX);
    let black_material = count_material(board, BLACK_INDEX);

    let white_no_pawns = white_material - board.pawns[WHITE_INDEX].len() as i32 * PAWN_VALUE;
    let black_no_pawns = black_material - board.pawns[BLACK_INDEX].len() as i32 * PAWN_VALUE;
    let white_endgame_weight = endgame_phase_weight(white_no_pawns);
    let black_endgame_weight = endgame_phase_weight(black_no_pawns);

    // Each side's tables are phased by how much the opponent has left
    let mut white_eval = white_material;
    let mut black_eval = black_material;
    white_eval +=
        mop_up_eval(board, WHITE_INDEX, white_material, black_material, black_endgame_weight);
    black_eval +=
        mop_up_eval(board, BLACK_INDEX, black_material, white_material, white_endgame_weight);
    white_eval += evaluate_piece_square_tables(board, WHITE_INDEX, black_endgame_weight);
    black_eval += evaluate_piece_square_tables(board, BLACK_INDEX, white_endgame_weight);

    let perspective = if board.white_to_move { 1 } else { -1 };
    (white_eval - black_eval) * perspective
}

/// 0.0 with full non-pawn material, rising to 1.0 at the endgame threshold
pub fn endgame_phase_weight(material_without_pawns: i32) -> f32 {
    1.0 - (material_without_pawns as f32 / ENDGAME_MATERIAL_START).min(1.0)
}

/// Material for one side, kings excluded
pub fn count_material(board: &Board, color_index: usize) -> i32 {
    board.pawns[color_index].len() as i32 * PAWN_VALUE
        + board.knights[color_index].len() as i32 * KNIGHT_VALUE
        + board.bishops[color_index].len() as i32 * BISHOP_VALUE
        + board.rooks[color_index].len() as i32 * ROOK_VALUE
        + board.queens[color_index].len() as i32 * QUEEN_VALUE
}

fn mop_up_eval(
    board: &Board,
    friendly_index: usize,
    my_material: i32,
    opponent_material: i32,
    endgame_weight: f32,
) -> i32 {
    if my_material > opponent_material + PAWN_VALUE * 2 && endgame_weight > 0.0 {
        let friendly_king = board.king_squares[friendly_index];
        let opponent_king = board.king_squares[1 - friendly_index];

        let mut score = CENTRE_MANHATTAN_DISTANCE[opponent_king] * 10;
        // Orthogonal distance encourages taking the opposition
        score += (14 - orthogonal_distance(friendly_king, opponent_king)) * 4;

        return (score as f32 * endgame_weight) as i32;
    }
    0
}

fn evaluate_piece_square_tables(board: &Board, color_index: usize, endgame_weight: f32) -> i32 {
    let is_white = color_index == WHITE_INDEX;
    let king = board.king_squares[color_index];
    let pawns = board.pawns[color_index].squares();

    let mut value = sum_pst(&ROOK_PST, board.rooks[color_index].squares(), is_white)
        + sum_pst(&KNIGHT_PST, board.knights[color_index].squares(), is_white)
        + sum_pst(&BISHOP_PST, board.bishops[color_index].squares(), is_white)
        + sum_pst(&QUEEN_PST, board.queens[color_index].squares(), is_white);

    let pawn_early = sum_pst(&PAWN_START_PST, pawns, is_white) as f32 * (1.0 - endgame_weight);
    let pawn_late = sum_pst(&PAWN_END_PST, pawns, is_white) as f32 * endgame_weight;
    let king_early = read_pst(&KING_START_PST, king, is_white) as f32 * (1.0 - endgame_weight);
    let king_late = read_pst(&KING_END_PST, king, is_white) as f32 * endgame_weight;

    value += pawn_early as i32 + pawn_late as i32 + king_early as i32 + king_late as i32;
    value
}
