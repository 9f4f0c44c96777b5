//! Gambit - FEN Module
//!
//! Parsing Forsyth-Edwards strings into a `PositionInfo` that the board
//! loads from, and producing a FEN snapshot of a live board.

use crate::board::Board;
use crate::error::{ChessError, Result};
use crate::move_generator::MoveGenerator;
use crate::moves::FLAG_EN_PASSANT;
use crate::piece_list::MAX_PIECES;
use crate::types::*;

/// Whether `current_fen` writes the en-passant square
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnPassantPolicy {
    /// Whenever the last move was a double pawn push
    Always,
    /// Only when a legal en-passant capture exists
    OnlyIfCapturable,
}

/// Everything a board needs to load a position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionInfo {
    pub squares: [u8; 64],
    pub white_to_move: bool,
    pub castling_rights: u8,
    /// 0 = none, else file + 1
    pub en_passant_file: u8,
    pub fifty_move_counter: u32,
    pub ply_count: u32,
}

pub fn start_position_info() -> PositionInfo {
    let mut squares = [EMPTY; 64];
    let back_rank = [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK];
    for (file, &piece) in back_rank.iter().enumerate() {
        squares[square_at(file, 0)] = make_piece(piece, WHITE);
        squares[square_at(file, 1)] = make_piece(PAWN, WHITE);
        squares[square_at(file, 6)] = make_piece(PAWN, BLACK);
        squares[square_at(file, 7)] = make_piece(piece, BLACK);
    }
    PositionInfo {
        squares,
        white_to_move: true,
        castling_rights: CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ,
        en_passant_file: 0,
        fifty_move_counter: 0,
        ply_count: 0,
    }
}

fn invalid(fen: &str, reason: &str) -> ChessError {
    ChessError::InvalidFen(format!("{} ({})", fen, reason))
}

/// Parse a FEN string. Placement and side to move are required; castling,
/// en passant and the two clocks default to `-`, `-`, `0` and `1`.
pub fn parse(fen: &str) -> Result<PositionInfo> {
    let sections: Vec<&str> = fen.split_whitespace().collect();
    if sections.len() < 2 {
        return Err(invalid(fen, "expected at least placement and side to move"));
    }

    let squares = parse_placement(fen, sections[0])?;

    let white_to_move = match sections[1] {
        "w" => true,
        "b" => false,
        _ => return Err(invalid(fen, "side to move must be w or b")),
    };

    let mut castling_rights = 0u8;
    let castling = sections.get(2).copied().unwrap_or("-");
    if castling != "-" {
        for c in castling.chars() {
            castling_rights |= match c {
                'K' => CASTLE_WK,
                'Q' => CASTLE_WQ,
                'k' => CASTLE_BK,
                'q' => CASTLE_BQ,
                _ => return Err(invalid(fen, "bad castling field")),
            };
        }
    }

    // Rights without the king and rook on their home squares are dropped
    for (mask, king_sq, rook_sq, color) in [
        (CASTLE_WK, 4, 7, WHITE),
        (CASTLE_WQ, 4, 0, WHITE),
        (CASTLE_BK, 60, 63, BLACK),
        (CASTLE_BQ, 60, 56, BLACK),
    ] {
        if squares[king_sq] != make_piece(KING, color)
            || squares[rook_sq] != make_piece(ROOK, color)
        {
            castling_rights &= !mask;
        }
    }

    let en_passant_file = match sections.get(3).copied().unwrap_or("-") {
        "-" => 0,
        name => {
            let sq = parse_square(name).map_err(|_| invalid(fen, "bad en-passant square"))?;
            if !en_passant_square_is_consistent(&squares, sq, white_to_move) {
                return Err(invalid(fen, "en-passant square does not follow a double pawn push"));
            }
            file_of(sq) as u8 + 1
        }
    };

    let fifty_move_counter = match sections.get(4) {
        Some(s) => s.parse::<u32>().map_err(|_| invalid(fen, "bad halfmove clock"))?,
        None => 0,
    };

    let fullmove = match sections.get(5) {
        Some(s) => s.parse::<u32>().map_err(|_| invalid(fen, "bad fullmove number"))?,
        None => 1,
    }
    .max(1);

    Ok(PositionInfo {
        squares,
        white_to_move,
        castling_rights,
        en_passant_file,
        fifty_move_counter,
        ply_count: 2 * (fullmove - 1) + u32::from(!white_to_move),
    })
}

/// The target square sits on the third rank behind an enemy pawn that just
/// moved two squares: the pawn stands in front of it, and the square and
/// the one the pawn left are both empty.
fn en_passant_square_is_consistent(squares: &[u8; 64], sq: usize, white_to_move: bool) -> bool {
    let (rank, pawn_sq, origin_sq, pushed_pawn) = if white_to_move {
        (5, sq.wrapping_sub(8), sq + 8, make_piece(PAWN, BLACK))
    } else {
        (2, sq + 8, sq.wrapping_sub(8), make_piece(PAWN, WHITE))
    };
    rank_of(sq) == rank
        && squares[pawn_sq] == pushed_pawn
        && squares[sq] == EMPTY
        && squares[origin_sq] == EMPTY
}

fn parse_placement(fen: &str, placement: &str) -> Result<[u8; 64]> {
    let mut squares = [EMPTY; 64];
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid(fen, "placement must have 8 ranks"));
    }

    let mut counts = [[0usize; 8]; 2];

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
                continue;
            }
            let piece = fen_to_piece(c).ok_or_else(|| invalid(fen, "unknown piece symbol"))?;
            if file >= 8 {
                return Err(invalid(fen, "rank describes more than 8 files"));
            }
            if piece_type(piece) == PAWN && (rank == 0 || rank == 7) {
                return Err(invalid(fen, "pawn on first or last rank"));
            }
            squares[square_at(file, rank)] = piece;
            counts[color_index(piece_color(piece))][piece_type(piece) as usize] += 1;
            file += 1;
        }
        if file != 8 {
            return Err(invalid(fen, "rank does not describe 8 files"));
        }
    }

    for by_type in counts.iter() {
        if by_type[KING as usize] != 1 {
            return Err(invalid(fen, "each side needs exactly one king"));
        }
        if by_type.iter().any(|&n| n > MAX_PIECES) {
            return Err(invalid(fen, "too many pieces of one type"));
        }
    }

    Ok(squares)
}

/// FEN snapshot of the board
pub fn current_fen(board: &Board, policy: EnPassantPolicy) -> String {
    let mut fen = String::new();

    for rank in (0..8).rev() {
        let mut empty_count = 0;
        for file in 0..8 {
            match piece_to_fen(board.squares[square_at(file, rank)]) {
                Some(c) => {
                    if empty_count > 0 {
                        fen.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    fen.push(c);
                }
                None => empty_count += 1,
            }
        }
        if empty_count > 0 {
            fen.push_str(&empty_count.to_string());
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push(if board.white_to_move { 'w' } else { 'b' });

    fen.push(' ');
    let state = board.current_state;
    if state.castling_rights() == 0 {
        fen.push('-');
    } else {
        for (mask, c) in [(CASTLE_WK, 'K'), (CASTLE_WQ, 'Q'), (CASTLE_BK, 'k'), (CASTLE_BQ, 'q')] {
            if state.has_castling_right(mask) {
                fen.push(c);
            }
        }
    }

    fen.push(' ');
    let include_ep = match policy {
        EnPassantPolicy::Always => true,
        EnPassantPolicy::OnlyIfCapturable => en_passant_capturable(board),
    };
    match board.en_passant_square() {
        Some(sq) if include_ep => fen.push_str(&square_name(sq)),
        _ => fen.push('-'),
    }

    fen.push_str(&format!(" {} {}", board.fifty_move_counter, board.ply_count / 2 + 1));

    fen
}

fn en_passant_capturable(board: &Board) -> bool {
    board.current_state.en_passant_file() != 0
        && MoveGenerator::new()
            .generate_moves(board, true)
            .iter()
            .any(|mv| mv.flag() == FLAG_EN_PASSANT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_FEN;

    #[test]
    fn test_start_position_matches_constant() {
        assert_eq!(parse(STARTING_FEN).unwrap(), start_position_info());
    }

    #[test]
    fn test_round_trip() {
        let fens = [
            STARTING_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 b - - 5 10",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(current_fen(&board, EnPassantPolicy::Always), fen);
        }
    }

    #[test]
    fn test_en_passant_policy() {
        // d6 is capturable by the e5 pawn
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(current_fen(&board, EnPassantPolicy::OnlyIfCapturable), fen);

        // nothing can take on e3
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(current_fen(&board, EnPassantPolicy::Always), fen);
        assert_eq!(
            current_fen(&board, EnPassantPolicy::OnlyIfCapturable),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let info = parse("4k3/8/8/8/8/8/8/4K3 b").unwrap();
        assert_eq!(info.castling_rights, 0);
        assert_eq!(info.en_passant_file, 0);
        assert_eq!(info.fifty_move_counter, 0);
        assert_eq!(info.ply_count, 1);
    }

    #[test]
    fn test_castling_rights_need_pieces_at_home() {
        let info = parse("4k2r/8/8/8/8/8/8/R3K3 w KQkq - 0 1").unwrap();
        assert_eq!(info.castling_rights, CASTLE_WQ | CASTLE_BK);
    }

    #[test]
    fn test_ply_count_from_fullmove() {
        let info = parse("4k3/8/8/8/8/8/8/4K3 w - - 12 30").unwrap();
        assert_eq!(info.ply_count, 58);
        assert_eq!(info.fifty_move_counter, 12);
    }

    #[test]
    fn test_rejects_malformed() {
        let bad = [
            "",
            "8/8/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
            "4k3/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KX2 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w Z - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - z9 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K2RR w - - 0 1",
            // no black pawn in front of d6
            "4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1",
            "4k3/p7/8/4P3/8/8/8/4K3 w - d6 0 1",
            // rank does not match the side to move
            "4k3/8/8/8/4P3/8/8/4K3 w - e3 0 1",
            // square or origin square occupied
            "4k3/8/3p4/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/3n4/8/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/8/8/8/4Pp2/4N3/8/4K3 b - e3 0 1",
        ];
        for fen in bad {
            assert!(matches!(parse(fen), Err(ChessError::InvalidFen(_))), "{}", fen);
        }
    }

    #[test]
    fn test_en_passant_square_after_double_push() {
        let info = parse("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(info.en_passant_file, 4);
        let info = parse("4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 1").unwrap();
        assert_eq!(info.en_passant_file, 5);
    }

    #[test]
    fn test_failed_load_keeps_board() {
        let mut board = Board::start_position();
        assert!(board.load_fen("not a fen").is_err());
        assert_eq!(current_fen(&board, EnPassantPolicy::Always), STARTING_FEN);
    }
}
