//! Gambit - Zobrist Hashing Module
//!
//! Random keys for every (piece, square), castling-rights nibble, en-passant
//! file and side to move. The keys are generated once from a fixed seed and
//! never change, so hashes are reproducible across runs and threads.

use crate::board::Board;
use crate::types::*;
use rand::prelude::*;
use std::sync::OnceLock;

const SEED: u64 = 29_426_028;

pub struct ZobristKeys {
    /// pieces[piece_type][color_index][square]
    pub pieces: [[[u64; 64]; 2]; 8],
    /// One key per castling-rights bitmask (0..15)
    pub castling: [u64; 16],
    /// Index 0 means no en-passant file and is always zero
    pub en_passant_file: [u64; 9],
    /// XOR this when it is black's turn to move
    pub side_to_move: u64,
}

static ZOBRIST: OnceLock<ZobristKeys> = OnceLock::new();

/// Shared read-only key table
pub fn keys() -> &'static ZobristKeys {
    ZOBRIST.get_or_init(ZobristKeys::generate)
}

impl ZobristKeys {
    fn generate() -> Self {
        let mut rng = StdRng::seed_from_u64(SEED);

        let mut pieces = [[[0u64; 64]; 2]; 8];
        for by_color in pieces.iter_mut() {
            for by_square in by_color.iter_mut() {
                for key in by_square.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.gen();
        }

        let mut en_passant_file = [0u64; 9];
        for key in en_passant_file.iter_mut().skip(1) {
            *key = rng.gen();
        }

        ZobristKeys {
            pieces,
            castling,
            en_passant_file,
            side_to_move: rng.gen(),
        }
    }

    #[inline]
    pub fn piece(&self, piece: u8, sq: usize) -> u64 {
        self.pieces[piece_type(piece) as usize][color_index(piece_color(piece))][sq]
    }
}

/// Hash a position from scratch. Only used at load time and for checks;
/// make/unmake keep the board's key up to date incrementally.
pub fn calculate(board: &Board) -> u64 {
    let keys = keys();
    let mut key = 0u64;

    for (sq, &piece) in board.squares.iter().enumerate() {
        if piece != EMPTY {
            key ^= keys.piece(piece, sq);
        }
    }

    key ^= keys.en_passant_file[board.current_state.en_passant_file() as usize];

    if !board.white_to_move {
        key ^= keys.side_to_move;
    }

    key ^= keys.castling[board.current_state.castling_rights() as usize];

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_en_passant_key_is_zero() {
        assert_eq!(keys().en_passant_file[0], 0);
        assert_ne!(keys().en_passant_file[1], 0);
    }

    #[test]
    fn test_keys_are_shared() {
        assert!(std::ptr::eq(keys(), keys()));
    }

    #[test]
    fn test_side_to_move_changes_hash() {
        let white = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let black = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(calculate(&white) ^ calculate(&black), keys().side_to_move);
    }
}
