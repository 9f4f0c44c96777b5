//! Gambit - Move Module
//!
//! A move is packed into 16 bits: start square in bits 0-5, target square in
//! bits 6-11 and a flag in bits 12-15. The all-zero value is the null move.

use crate::board::Board;
use crate::error::{ChessError, Result};
use crate::types::*;
use std::fmt;

const START_MASK: u16 = 0b0000_0000_0011_1111;
const TARGET_MASK: u16 = 0b0000_1111_1100_0000;

/// Special-move flags stored in the top four bits
pub const FLAG_NONE: u8 = 0;
pub const FLAG_EN_PASSANT: u8 = 1;
pub const FLAG_CASTLING: u8 = 2;
pub const FLAG_PROMOTE_QUEEN: u8 = 3;
pub const FLAG_PROMOTE_KNIGHT: u8 = 4;
pub const FLAG_PROMOTE_ROOK: u8 = 5;
pub const FLAG_PROMOTE_BISHOP: u8 = 6;
pub const FLAG_PAWN_TWO_FORWARD: u8 = 7;

/// Represents a chess move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    /// Null move constant
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(start: usize, target: usize) -> Self {
        Move((start as u16) | ((target as u16) << 6))
    }

    #[inline]
    pub const fn with_flag(start: usize, target: usize, flag: u8) -> Self {
        Move((start as u16) | ((target as u16) << 6) | ((flag as u16) << 12))
    }

    #[inline]
    pub const fn from_value(value: u16) -> Self {
        Move(value)
    }

    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn start(self) -> usize {
        (self.0 & START_MASK) as usize
    }

    #[inline]
    pub const fn target(self) -> usize {
        ((self.0 & TARGET_MASK) >> 6) as usize
    }

    #[inline]
    pub const fn flag(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Null checks compare the whole value, a1a1 with a flag is not null
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        let flag = self.flag();
        flag >= FLAG_PROMOTE_QUEEN && flag <= FLAG_PROMOTE_BISHOP
    }

    /// Piece type a promotion produces, `EMPTY` for other moves
    pub const fn promotion_piece_type(self) -> u8 {
        match self.flag() {
            FLAG_PROMOTE_QUEEN => QUEEN,
            FLAG_PROMOTE_KNIGHT => KNIGHT,
            FLAG_PROMOTE_ROOK => ROOK,
            FLAG_PROMOTE_BISHOP => BISHOP,
            _ => EMPTY,
        }
    }

    /// Convert move to coordinate notation (e.g., "e2e4", "e7e8q")
    pub fn to_uci(self) -> String {
        if self.is_null() {
            return "0000".to_string();
        }
        let mut uci = format!("{}{}", square_name(self.start()), square_name(self.target()));
        let promo = match self.promotion_piece_type() {
            QUEEN => Some('q'),
            ROOK => Some('r'),
            BISHOP => Some('b'),
            KNIGHT => Some('n'),
            _ => None,
        };
        if let Some(c) = promo {
            uci.push(c);
        }
        uci
    }

    /// Parse coordinate notation against a position, deducing the flag from
    /// the piece being moved. Legality is not checked here.
    pub fn from_uci(uci: &str, board: &Board) -> Result<Move> {
        if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
            return Err(ChessError::InvalidMoveString(uci.to_string()));
        }
        let start = parse_square(&uci[0..2])
            .map_err(|_| ChessError::InvalidMoveString(uci.to_string()))?;
        let target = parse_square(&uci[2..4])
            .map_err(|_| ChessError::InvalidMoveString(uci.to_string()))?;

        let moved_type = piece_type(board.squares[start]);
        let mut flag = FLAG_NONE;

        if let Some(c) = uci[4..].chars().next() {
            flag = match c {
                'q' => FLAG_PROMOTE_QUEEN,
                'n' => FLAG_PROMOTE_KNIGHT,
                'r' => FLAG_PROMOTE_ROOK,
                'b' => FLAG_PROMOTE_BISHOP,
                _ => return Err(ChessError::InvalidMoveString(uci.to_string())),
            };
        } else if moved_type == PAWN {
            if rank_of(start).abs_diff(rank_of(target)) == 2 {
                flag = FLAG_PAWN_TWO_FORWARD;
            } else if file_of(start) != file_of(target) && board.squares[target] == EMPTY {
                flag = FLAG_EN_PASSANT;
            }
        } else if moved_type == KING && file_of(start).abs_diff(file_of(target)) > 1 {
            flag = FLAG_CASTLING;
        }

        Ok(Move::with_flag(start, target, flag))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let mv = Move::with_flag(12, 28, FLAG_PAWN_TWO_FORWARD);
        assert_eq!(mv.start(), 12);
        assert_eq!(mv.target(), 28);
        assert_eq!(mv.flag(), FLAG_PAWN_TWO_FORWARD);
        assert_eq!(mv.value(), 12 | (28 << 6) | (7 << 12));
        assert_eq!(mv.to_uci(), "e2e4");
    }

    #[test]
    fn test_null_is_by_value() {
        assert!(Move::NULL.is_null());
        assert!(Move::default().is_null());
        assert!(!Move::with_flag(0, 0, FLAG_CASTLING).is_null());
    }

    #[test]
    fn test_promotion_notation() {
        let mv = Move::with_flag(52, 60, FLAG_PROMOTE_KNIGHT);
        assert!(mv.is_promotion());
        assert_eq!(mv.promotion_piece_type(), KNIGHT);
        assert_eq!(mv.to_uci(), "e7e8n");
    }

    #[test]
    fn test_from_uci_deduces_flags() {
        let board = Board::start_position();
        assert_eq!(Move::from_uci("e2e4", &board).unwrap().flag(), FLAG_PAWN_TWO_FORWARD);
        assert_eq!(Move::from_uci("g1f3", &board).unwrap().flag(), FLAG_NONE);

        let board = Board::from_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 0 1").unwrap();
        assert_eq!(Move::from_uci("e1g1", &board).unwrap().flag(), FLAG_CASTLING);
        assert_eq!(Move::from_uci("e1c1", &board).unwrap().flag(), FLAG_CASTLING);
        assert_eq!(Move::from_uci("e5d6", &board).unwrap().flag(), FLAG_EN_PASSANT);

        let board = Board::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert_eq!(Move::from_uci("e7e8r", &board).unwrap().flag(), FLAG_PROMOTE_ROOK);
    }

    #[test]
    fn test_from_uci_rejects_garbage() {
        let board = Board::start_position();
        assert!(Move::from_uci("e2", &board).is_err());
        assert!(Move::from_uci("z2e4", &board).is_err());
        assert!(Move::from_uci("e7e8x", &board).is_err());
    }
}
