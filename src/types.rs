//! Gambit - Piece and square definitions
//!
//! A piece is a single byte: the low three bits hold the type and bits 3-4
//! hold the colour. Squares are `usize` indices with a1 = 0 and h8 = 63.

use crate::error::{ChessError, Result};

/// Piece type constants (lower 3 bits)
pub const EMPTY: u8 = 0;
pub const PAWN: u8 = 1;
pub const KNIGHT: u8 = 2;
pub const BISHOP: u8 = 3;
pub const ROOK: u8 = 4;
pub const QUEEN: u8 = 5;
pub const KING: u8 = 6;

/// Color constants (bits 3-4)
pub const WHITE: u8 = 8;
pub const BLACK: u8 = 16;

pub const PIECE_MASK: u8 = 0b111;
pub const COLOR_MASK: u8 = 0b11000;

/// Index into per-colour arrays
pub const WHITE_INDEX: usize = 0;
pub const BLACK_INDEX: usize = 1;

/// Castling rights bitmasks
pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"12345678";

/// Build a piece code from type and colour
#[inline]
pub const fn make_piece(piece_type: u8, color: u8) -> u8 {
    piece_type | color
}

#[inline]
pub const fn piece_type(piece: u8) -> u8 {
    piece & PIECE_MASK
}

#[inline]
pub const fn piece_color(piece: u8) -> u8 {
    piece & COLOR_MASK
}

#[inline]
pub const fn is_color(piece: u8, color: u8) -> bool {
    piece != EMPTY && piece & COLOR_MASK == color
}

/// Rooks and queens
#[inline]
pub const fn is_orthogonal_slider(piece: u8) -> bool {
    let t = piece_type(piece);
    t == ROOK || t == QUEEN
}

/// Bishops and queens
#[inline]
pub const fn is_diagonal_slider(piece: u8) -> bool {
    let t = piece_type(piece);
    t == BISHOP || t == QUEEN
}

/// 0 for white, 1 for black
#[inline]
pub const fn color_index(color: u8) -> usize {
    if color == WHITE {
        WHITE_INDEX
    } else {
        BLACK_INDEX
    }
}

#[inline]
pub const fn opposite(color: u8) -> u8 {
    if color == WHITE {
        BLACK
    } else {
        WHITE
    }
}

#[inline]
pub const fn file_of(sq: usize) -> usize {
    sq & 7
}

#[inline]
pub const fn rank_of(sq: usize) -> usize {
    sq >> 3
}

#[inline]
pub const fn square_at(file: usize, rank: usize) -> usize {
    rank * 8 + file
}

/// Squares of the same colour as a1 return false
#[inline]
pub const fn is_light_square(sq: usize) -> bool {
    (file_of(sq) + rank_of(sq)) % 2 != 0
}

/// Convert square index (0-63) to algebraic notation (e.g., "e4")
pub fn square_name(sq: usize) -> String {
    format!(
        "{}{}",
        FILE_NAMES[file_of(sq)] as char,
        RANK_NAMES[rank_of(sq)] as char
    )
}

/// Convert algebraic notation to square index
pub fn parse_square(name: &str) -> Result<usize> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 {
        return Err(ChessError::InvalidSquare(name.to_string()));
    }
    let file = match bytes[0] {
        b'a'..=b'h' => (bytes[0] - b'a') as usize,
        _ => return Err(ChessError::InvalidSquare(name.to_string())),
    };
    let rank = match bytes[1] {
        b'1'..=b'8' => (bytes[1] - b'1') as usize,
        _ => return Err(ChessError::InvalidSquare(name.to_string())),
    };
    Ok(square_at(file, rank))
}

/// FEN piece character to piece value
pub fn fen_to_piece(c: char) -> Option<u8> {
    let piece_type = match c.to_ascii_lowercase() {
        'p' => PAWN,
        'n' => KNIGHT,
        'b' => BISHOP,
        'r' => ROOK,
        'q' => QUEEN,
        'k' => KING,
        _ => return None,
    };
    let color = if c.is_ascii_uppercase() { WHITE } else { BLACK };
    Some(make_piece(piece_type, color))
}

/// Piece value to FEN character
pub fn piece_to_fen(piece: u8) -> Option<char> {
    let c = match piece_type(piece) {
        PAWN => 'p',
        KNIGHT => 'n',
        BISHOP => 'b',
        ROOK => 'r',
        QUEEN => 'q',
        KING => 'k',
        _ => return None,
    };
    if piece_color(piece) == WHITE {
        Some(c.to_ascii_uppercase())
    } else {
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_encoding() {
        let wq = make_piece(QUEEN, WHITE);
        assert_eq!(piece_type(wq), QUEEN);
        assert_eq!(piece_color(wq), WHITE);
        assert!(is_color(wq, WHITE));
        assert!(!is_color(EMPTY, WHITE));
        assert!(is_orthogonal_slider(wq) && is_diagonal_slider(wq));
        assert!(!is_diagonal_slider(make_piece(ROOK, BLACK)));
    }

    #[test]
    fn test_square_names() {
        assert_eq!(square_name(0), "a1");
        assert_eq!(square_name(63), "h8");
        assert_eq!(parse_square("e4"), Ok(28));
        assert!(parse_square("i1").is_err());
        assert!(parse_square("e44").is_err());
    }

    #[test]
    fn test_fen_symbols() {
        for c in "PNBRQKpnbrqk".chars() {
            let piece = fen_to_piece(c).unwrap();
            assert_eq!(piece_to_fen(piece), Some(c));
        }
        assert_eq!(fen_to_piece('x'), None);
    }

    #[test]
    fn test_light_squares() {
        assert!(!is_light_square(0)); // a1 is dark
        assert!(is_light_square(7)); // h1 is light
    }
}
