//! Gambit - Arbiter Module
//!
//! Decides whether a real game is over: mate, stalemate, the fifty-move
//! rule, threefold repetition and insufficient material. Search uses its
//! own cheaper draw test; this one follows the rules of play.

use std::fmt;

use crate::board::Board;
use crate::move_generator::MoveGenerator;
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameResult {
    NotStarted,
    InProgress,
    WhiteIsMated,
    BlackIsMated,
    Stalemate,
    Repetition,
    FiftyMoveRule,
    InsufficientMaterial,
    DrawByArbiter,
    WhiteTimeout,
    BlackTimeout,
    WhiteIllegalMove,
    BlackIllegalMove,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameResult::NotStarted => "not started",
            GameResult::InProgress => "in progress",
            GameResult::WhiteIsMated => "black wins by checkmate",
            GameResult::BlackIsMated => "white wins by checkmate",
            GameResult::Stalemate => "draw by stalemate",
            GameResult::Repetition => "draw by threefold repetition",
            GameResult::FiftyMoveRule => "draw by fifty-move rule",
            GameResult::InsufficientMaterial => "draw by insufficient material",
            GameResult::DrawByArbiter => "draw by arbiter",
            GameResult::WhiteTimeout => "black wins on time",
            GameResult::BlackTimeout => "white wins on time",
            GameResult::WhiteIllegalMove => "black wins, white made an illegal move",
            GameResult::BlackIllegalMove => "white wins, black made an illegal move",
        };
        f.write_str(text)
    }
}

pub fn is_draw_result(result: GameResult) -> bool {
    matches!(
        result,
        GameResult::DrawByArbiter
            | GameResult::FiftyMoveRule
            | GameResult::Repetition
            | GameResult::Stalemate
            | GameResult::InsufficientMaterial
    )
}

pub fn is_white_wins_result(result: GameResult) -> bool {
    matches!(
        result,
        GameResult::BlackIsMated | GameResult::BlackTimeout | GameResult::BlackIllegalMove
    )
}

pub fn is_black_wins_result(result: GameResult) -> bool {
    matches!(
        result,
        GameResult::WhiteIsMated | GameResult::WhiteTimeout | GameResult::WhiteIllegalMove
    )
}

/// Status of the game at the current position
pub fn game_state(board: &Board) -> GameResult {
    let mut generator = MoveGenerator::new();
    let moves = generator.generate_moves(board, false);

    if moves.is_empty() {
        if generator.in_check() {
            return if board.white_to_move {
                GameResult::WhiteIsMated
            } else {
                GameResult::BlackIsMated
            };
        }
        return GameResult::Stalemate;
    }

    if board.fifty_move_counter >= 100 {
        return GameResult::FiftyMoveRule;
    }

    if board.repetition_count() >= 3 {
        return GameResult::Repetition;
    }

    if insufficient_material(board) {
        return GameResult::InsufficientMaterial;
    }

    GameResult::InProgress
}

/// Neither side can ever deliver mate
pub fn insufficient_material(board: &Board) -> bool {
    let heavy_or_pawns = (0..2).any(|c| {
        !board.pawns[c].is_empty() || !board.rooks[c].is_empty() || !board.queens[c].is_empty()
    });
    if heavy_or_pawns {
        return false;
    }

    let white_bishops = board.bishops[WHITE_INDEX].len();
    let black_bishops = board.bishops[BLACK_INDEX].len();
    let knights = board.knights[WHITE_INDEX].len() + board.knights[BLACK_INDEX].len();
    let minors = knights + white_bishops + black_bishops;

    // Lone king, or king and one minor against a lone king
    if minors <= 1 {
        return true;
    }

    // King and bishop each, bishops on the same colour
    if minors == 2 && white_bishops == 1 && black_bishops == 1 {
        let white_light = is_light_square(board.bishops[WHITE_INDEX].squares()[0]);
        let black_light = is_light_square(board.bishops[BLACK_INDEX].squares()[0]);
        return white_light == black_light;
    }

    false
}
