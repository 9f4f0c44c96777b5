//! Gambit - Board Representation Module
//!
//! Mutable position with reversible make/unmake. The square array is the
//! source of truth for occupancy; per-colour piece lists mirror it so the
//! move generator and evaluator can iterate pieces by type. Everything that
//! cannot be recomputed on unmake (castling rights, en-passant file, the
//! captured piece and the fifty-move counter) lives in a packed `GameState`
//! that is pushed on every move and popped on unmake.

use crate::error::Result;
use crate::fen::{self, PositionInfo};
use crate::move_generator::MoveGenerator;
use crate::moves::*;
use crate::piece_list::PieceList;
use crate::types::*;
use crate::zobrist;
use std::fmt;

/// Starting position FEN
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Corner squares whose rooks carry castling rights
const A1: usize = 0;
const H1: usize = 7;
const A8: usize = 56;
const H8: usize = 63;

// ============================================================================
// GAME STATE
// ============================================================================

/// Packed irreversible state:
/// bits 0-3 castling rights, bits 4-7 en-passant file (0 = none, else file + 1),
/// bits 8-13 captured piece type, bits 14+ fifty-move counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GameState(u32);

impl GameState {
    pub const fn new(
        castling: u8,
        en_passant_file: u8,
        captured_type: u8,
        fifty_move_counter: u32,
    ) -> Self {
        GameState(
            (castling as u32 & 0b1111)
                | ((en_passant_file as u32 & 0b1111) << 4)
                | ((captured_type as u32 & 0b11_1111) << 8)
                | (fifty_move_counter << 14),
        )
    }

    #[inline]
    pub const fn castling_rights(self) -> u8 {
        (self.0 & 0b1111) as u8
    }

    /// 0 when no en-passant capture is possible, otherwise file + 1
    #[inline]
    pub const fn en_passant_file(self) -> u8 {
        ((self.0 >> 4) & 0b1111) as u8
    }

    #[inline]
    pub const fn captured_type(self) -> u8 {
        ((self.0 >> 8) & 0b11_1111) as u8
    }

    #[inline]
    pub const fn fifty_move_counter(self) -> u32 {
        self.0 >> 14
    }

    #[inline]
    pub const fn has_castling_right(self, mask: u8) -> bool {
        self.castling_rights() & mask != 0
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Chess board representation
#[derive(Clone)]
pub struct Board {
    /// 64-element array representing the board (0=a1, 1=b1, ..., 63=h8)
    pub squares: [u8; 64],
    /// King square per colour index
    pub king_squares: [usize; 2],
    pub pawns: [PieceList; 2],
    pub knights: [PieceList; 2],
    pub bishops: [PieceList; 2],
    pub rooks: [PieceList; 2],
    pub queens: [PieceList; 2],

    pub white_to_move: bool,
    pub color_to_move: u8,
    pub opponent_color: u8,
    pub color_to_move_index: usize,

    pub current_state: GameState,
    game_state_history: Vec<GameState>,

    /// Plies since the start of the game
    pub ply_count: u32,
    /// Plies since the last pawn move or capture
    pub fifty_move_counter: u32,
    pub zobrist_key: u64,
    /// Keys of every position since the last pawn move or capture,
    /// including the current one
    pub repetition_history: Vec<u64>,
}

impl Board {
    fn empty() -> Self {
        Board {
            squares: [EMPTY; 64],
            king_squares: [0; 2],
            pawns: Default::default(),
            knights: Default::default(),
            bishops: Default::default(),
            rooks: Default::default(),
            queens: Default::default(),
            white_to_move: true,
            color_to_move: WHITE,
            opponent_color: BLACK,
            color_to_move_index: WHITE_INDEX,
            current_state: GameState::default(),
            game_state_history: Vec::with_capacity(64),
            ply_count: 0,
            fifty_move_counter: 0,
            zobrist_key: 0,
            repetition_history: Vec::with_capacity(64),
        }
    }

    /// Create a new board with the starting position
    pub fn start_position() -> Self {
        let mut board = Board::empty();
        board.load(&fen::start_position_info());
        board
    }

    /// Create a board from a FEN string
    pub fn from_fen(fen_str: &str) -> Result<Self> {
        let info = fen::parse(fen_str)?;
        let mut board = Board::empty();
        board.load(&info);
        Ok(board)
    }

    /// Replace the position. On error the board is left untouched.
    pub fn load_fen(&mut self, fen_str: &str) -> Result<()> {
        let info = fen::parse(fen_str)?;
        self.load(&info);
        Ok(())
    }

    /// Full reset from a parsed position
    pub fn load(&mut self, info: &PositionInfo) {
        *self = Board::empty();

        for (sq, &piece) in info.squares.iter().enumerate() {
            if piece == EMPTY {
                continue;
            }
            self.squares[sq] = piece;
            let ci = color_index(piece_color(piece));
            if piece_type(piece) == KING {
                self.king_squares[ci] = sq;
            } else {
                self.piece_list_mut(piece_type(piece), ci).add(sq);
            }
        }

        self.set_side(info.white_to_move);
        self.ply_count = info.ply_count;
        self.fifty_move_counter = info.fifty_move_counter;

        let state = GameState::new(
            info.castling_rights,
            info.en_passant_file,
            EMPTY,
            info.fifty_move_counter,
        );
        self.current_state = state;
        self.game_state_history.push(state);

        self.zobrist_key = zobrist::calculate(self);
        self.repetition_history.push(self.zobrist_key);
    }

    fn set_side(&mut self, white_to_move: bool) {
        self.white_to_move = white_to_move;
        self.color_to_move = if white_to_move { WHITE } else { BLACK };
        self.opponent_color = opposite(self.color_to_move);
        self.color_to_move_index = color_index(self.color_to_move);
    }

    /// Piece list for a non-king piece type
    pub fn piece_list(&self, piece_type: u8, color_index: usize) -> &PieceList {
        match piece_type {
            PAWN => &self.pawns[color_index],
            KNIGHT => &self.knights[color_index],
            BISHOP => &self.bishops[color_index],
            ROOK => &self.rooks[color_index],
            _ => &self.queens[color_index],
        }
    }

    fn piece_list_mut(&mut self, piece_type: u8, color_index: usize) -> &mut PieceList {
        match piece_type {
            PAWN => &mut self.pawns[color_index],
            KNIGHT => &mut self.knights[color_index],
            BISHOP => &mut self.bishops[color_index],
            ROOK => &mut self.rooks[color_index],
            _ => &mut self.queens[color_index],
        }
    }

    // ========================================================================
    // MAKE / UNMAKE
    // ========================================================================

    /// Play a move. `in_search` suppresses repetition-history bookkeeping
    /// that only matters for real game history.
    pub fn make_move(&mut self, mv: Move, in_search: bool) {
        let keys = zobrist::keys();
        let us = self.color_to_move_index;
        let them = 1 - us;

        let start = mv.start();
        let target = mv.target();
        let flag = mv.flag();
        let is_promotion = mv.is_promotion();
        let is_en_passant = flag == FLAG_EN_PASSANT;

        let old_state = self.current_state;
        let old_castling = old_state.castling_rights();
        let mut new_castling = old_castling;
        let mut new_en_passant_file = 0u8;

        let moved_piece = self.squares[start];
        let moved_type = piece_type(moved_piece);
        let captured_type = if is_en_passant {
            PAWN
        } else {
            piece_type(self.squares[target])
        };

        // Regular capture
        if captured_type != EMPTY && !is_en_passant {
            self.zobrist_key ^= keys.piece(self.squares[target], target);
            self.piece_list_mut(captured_type, them).remove(target);
        }

        // Move the piece itself
        if moved_type == KING {
            self.king_squares[us] = target;
            new_castling &= if self.white_to_move { 0b1100 } else { 0b0011 };
        } else {
            self.piece_list_mut(moved_type, us).move_piece(start, target);
        }

        let mut final_piece = moved_piece;

        if is_promotion {
            let promote_type = mv.promotion_piece_type();
            final_piece = make_piece(promote_type, self.color_to_move);
            self.pawns[us].remove(target);
            self.piece_list_mut(promote_type, us).add(target);
        } else {
            match flag {
                FLAG_EN_PASSANT => {
                    let ep_square = if self.white_to_move { target - 8 } else { target + 8 };
                    self.zobrist_key ^= keys.piece(self.squares[ep_square], ep_square);
                    self.squares[ep_square] = EMPTY;
                    self.pawns[them].remove(ep_square);
                }
                FLAG_CASTLING => {
                    let (rook_from, rook_to) = castling_rook_squares(target);
                    let rook = make_piece(ROOK, self.color_to_move);
                    self.squares[rook_from] = EMPTY;
                    self.squares[rook_to] = rook;
                    self.rooks[us].move_piece(rook_from, rook_to);
                    self.zobrist_key ^= keys.piece(rook, rook_from);
                    self.zobrist_key ^= keys.piece(rook, rook_to);
                }
                FLAG_PAWN_TWO_FORWARD => {
                    new_en_passant_file = file_of(start) as u8 + 1;
                    self.zobrist_key ^= keys.en_passant_file[new_en_passant_file as usize];
                }
                _ => {}
            }
        }

        self.squares[target] = final_piece;
        self.squares[start] = EMPTY;

        // Rook squares touched lose their castling right
        for sq in [start, target] {
            new_castling &= match sq {
                H1 => !CASTLE_WK,
                A1 => !CASTLE_WQ,
                H8 => !CASTLE_BK,
                A8 => !CASTLE_BQ,
                _ => 0b1111,
            };
        }

        self.zobrist_key ^= keys.side_to_move;
        self.zobrist_key ^= keys.piece(moved_piece, start);
        self.zobrist_key ^= keys.piece(final_piece, target);
        self.zobrist_key ^= keys.en_passant_file[old_state.en_passant_file() as usize];
        if new_castling != old_castling {
            self.zobrist_key ^= keys.castling[old_castling as usize];
            self.zobrist_key ^= keys.castling[new_castling as usize];
        }

        let irreversible = moved_type == PAWN || captured_type != EMPTY;
        self.fifty_move_counter = if irreversible { 0 } else { self.fifty_move_counter + 1 };

        let new_state = GameState::new(
            new_castling,
            new_en_passant_file,
            captured_type,
            self.fifty_move_counter,
        );
        self.current_state = new_state;
        self.game_state_history.push(new_state);

        self.set_side(!self.white_to_move);
        self.ply_count += 1;

        if !in_search {
            if irreversible {
                self.repetition_history.clear();
            }
            self.repetition_history.push(self.zobrist_key);
        }
    }

    /// Undo the most recent `make_move`. Calls must mirror makes exactly.
    pub fn unmake_move(&mut self, mv: Move, in_search: bool) {
        let keys = zobrist::keys();

        // Back to the side that made the move
        self.set_side(!self.white_to_move);
        let us = self.color_to_move_index;
        let them = 1 - us;

        let start = mv.start();
        let target = mv.target();
        let flag = mv.flag();
        let is_promotion = mv.is_promotion();
        let is_en_passant = flag == FLAG_EN_PASSANT;

        let undone_state = self.current_state;
        let captured_type = undone_state.captured_type();

        let final_piece = self.squares[target];
        let moved_piece = if is_promotion {
            make_piece(PAWN, self.color_to_move)
        } else {
            final_piece
        };
        let moved_type = piece_type(moved_piece);

        self.zobrist_key ^= keys.side_to_move;
        self.zobrist_key ^= keys.piece(moved_piece, start);
        self.zobrist_key ^= keys.piece(final_piece, target);

        // Put the piece back
        if is_promotion {
            self.piece_list_mut(piece_type(final_piece), us).remove(target);
            self.pawns[us].add(start);
        } else if moved_type == KING {
            self.king_squares[us] = start;
        } else {
            self.piece_list_mut(moved_type, us).move_piece(target, start);
        }
        self.squares[start] = moved_piece;
        self.squares[target] = EMPTY;

        // Restore a captured piece
        if captured_type != EMPTY {
            let captured_square = if is_en_passant {
                if self.white_to_move { target - 8 } else { target + 8 }
            } else {
                target
            };
            let captured_piece = make_piece(captured_type, self.opponent_color);
            self.squares[captured_square] = captured_piece;
            self.piece_list_mut(captured_type, them).add(captured_square);
            self.zobrist_key ^= keys.piece(captured_piece, captured_square);
        }

        if flag == FLAG_CASTLING {
            let (rook_from, rook_to) = castling_rook_squares(target);
            let rook = make_piece(ROOK, self.color_to_move);
            self.squares[rook_to] = EMPTY;
            self.squares[rook_from] = rook;
            self.rooks[us].move_piece(rook_to, rook_from);
            self.zobrist_key ^= keys.piece(rook, rook_from);
            self.zobrist_key ^= keys.piece(rook, rook_to);
        }

        self.game_state_history.pop();
        self.current_state = self
            .game_state_history
            .last()
            .copied()
            .unwrap_or_default();
        self.fifty_move_counter = self.current_state.fifty_move_counter();

        self.zobrist_key ^= keys.en_passant_file[undone_state.en_passant_file() as usize];
        self.zobrist_key ^= keys.en_passant_file[self.current_state.en_passant_file() as usize];
        if undone_state.castling_rights() != self.current_state.castling_rights() {
            self.zobrist_key ^= keys.castling[undone_state.castling_rights() as usize];
            self.zobrist_key ^= keys.castling[self.current_state.castling_rights() as usize];
        }

        self.ply_count -= 1;

        if !in_search {
            self.repetition_history.pop();
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// True if the side to move is attacked
    pub fn is_in_check(&self) -> bool {
        MoveGenerator::new().is_in_check(self)
    }

    /// En-passant target square, if the last move was a double pawn push
    pub fn en_passant_square(&self) -> Option<usize> {
        match self.current_state.en_passant_file() {
            0 => None,
            f => {
                let rank = if self.white_to_move { 5 } else { 2 };
                Some(square_at(f as usize - 1, rank))
            }
        }
    }

    /// Number of times the current position appears in the repetition history
    pub fn repetition_count(&self) -> usize {
        self.repetition_history
            .iter()
            .filter(|&&key| key == self.zobrist_key)
            .count()
    }

    /// Text diagram of the board
    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        lines.push("  +---+---+---+---+---+---+---+---+".to_string());

        for rank in (0..8).rev() {
            let mut row = format!("{} |", rank + 1);
            for file in 0..8 {
                match piece_to_fen(self.squares[square_at(file, rank)]) {
                    Some(c) => row.push_str(&format!(" {} |", c)),
                    None => row.push_str("   |"),
                }
            }
            lines.push(row);
            lines.push("  +---+---+---+---+---+---+---+---+".to_string());
        }
        lines.push("    a   b   c   d   e   f   g   h".to_string());
        lines.push(format!("Fen: {}", fen::current_fen(self, fen::EnPassantPolicy::Always)));
        lines.push(format!("Key: {:016X}", self.zobrist_key));

        lines.join("\n")
    }
}

/// Rook (from, to) squares for a castling move landing on `king_target`
fn castling_rook_squares(king_target: usize) -> (usize, usize) {
    let kingside = file_of(king_target) == 6;
    if kingside {
        (king_target + 1, king_target - 1)
    } else {
        (king_target - 2, king_target + 1)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::start_position()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("fen", &fen::current_fen(self, fen::EnPassantPolicy::Always))
            .field("zobrist_key", &format_args!("{:016X}", self.zobrist_key))
            .finish()
    }
}
