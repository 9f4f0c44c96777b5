//! Gambit - Move Generator Module
//!
//! Strictly legal move generation. Before any moves are emitted the
//! generator builds the opponent's attack maps and walks the eight rays
//! around the friendly king to find checks and pins; every piece is then
//! restricted by that data instead of being made and tested.

use std::ops::Range;

use crate::bitboard::*;
use crate::board::Board;
use crate::moves::*;
use crate::types::*;

/// Which promotion pieces to generate. Search uses a reduced set to keep
/// branching down; rules-facing callers want them all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PromotionMode {
    #[default]
    All,
    QueenOnly,
    QueenAndKnight,
}

// Diagonal directions white/black pawns capture along
const PAWN_ATTACK_DIRECTIONS: [[usize; 2]; 2] = [[4, 6], [7, 5]];

/// Move generator with per-call scratch state
#[derive(Clone, Debug, Default)]
pub struct MoveGenerator {
    pub promotions_to_generate: PromotionMode,

    in_check: bool,
    in_double_check: bool,
    pins_exist: bool,
    check_ray_mask: u64,
    pin_ray_mask: u64,
    opponent_sliding_attack_map: u64,
    opponent_knight_attacks: u64,
    opponent_pawn_attack_map: u64,
    opponent_attack_map_no_pawns: u64,
    opponent_attack_map: u64,

    captures_only: bool,
    friendly_color: u8,
    opponent_color: u8,
    friendly_index: usize,
    opponent_index: usize,
    friendly_king_square: usize,
}

impl MoveGenerator {
    pub fn new() -> Self {
        MoveGenerator::default()
    }

    pub fn with_promotions(mode: PromotionMode) -> Self {
        MoveGenerator {
            promotions_to_generate: mode,
            ..MoveGenerator::default()
        }
    }

    /// Legal moves for the side to move. With `captures_only` quiet moves
    /// are dropped but captures, promotions and en passant remain.
    pub fn generate_moves(&mut self, board: &Board, captures_only: bool) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        self.captures_only = captures_only;
        self.init(board);
        self.compute_attack_data(board);

        self.generate_king_moves(board, &mut moves);

        // Only king moves are legal in double check
        if self.in_double_check {
            return moves;
        }

        self.generate_sliding_moves(board, &mut moves);
        self.generate_knight_moves(board, &mut moves);
        self.generate_pawn_moves(board, &mut moves);

        moves
    }

    /// Check detection only, no move list
    pub fn is_in_check(&mut self, board: &Board) -> bool {
        self.init(board);
        self.compute_attack_data(board);
        self.in_check
    }

    /// Whether the side to move was in check at the last generation
    #[inline]
    pub fn in_check(&self) -> bool {
        self.in_check
    }

    /// Squares attacked by opponent pawns at the last generation
    #[inline]
    pub fn opponent_pawn_attack_map(&self) -> u64 {
        self.opponent_pawn_attack_map
    }

    /// Every square the opponent attacked at the last generation
    #[inline]
    pub fn opponent_attack_map(&self) -> u64 {
        self.opponent_attack_map
    }

    fn init(&mut self, board: &Board) {
        self.in_check = false;
        self.in_double_check = false;
        self.pins_exist = false;
        self.check_ray_mask = 0;
        self.pin_ray_mask = 0;

        self.friendly_color = board.color_to_move;
        self.opponent_color = board.opponent_color;
        self.friendly_index = board.color_to_move_index;
        self.opponent_index = 1 - board.color_to_move_index;
        self.friendly_king_square = board.king_squares[self.friendly_index];
    }

    // ========================================================================
    // KING
    // ========================================================================

    fn generate_king_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let king = self.friendly_king_square;
        let mut targets = KING_ATTACKS[king];

        while targets != 0 {
            let target = pop_lsb(&mut targets);
            let piece = board.squares[target];

            if is_color(piece, self.friendly_color) {
                continue;
            }

            let is_capture = is_color(piece, self.opponent_color);
            if !is_capture && (self.captures_only || self.square_is_in_check_ray(target)) {
                continue;
            }

            if self.square_is_attacked(target) {
                continue;
            }
            moves.push(Move::new(king, target));

            // Castling steps through the square just found to be safe
            if self.in_check || is_capture {
                continue;
            }
            let (kingside_right, queenside_right) = if board.white_to_move {
                (CASTLE_WK, CASTLE_WQ)
            } else {
                (CASTLE_BK, CASTLE_BQ)
            };
            let state = board.current_state;
            let file = file_of(target);

            if target == king + 1 && file == 5 && state.has_castling_right(kingside_right) {
                let castle_square = target + 1;
                if board.squares[castle_square] == EMPTY
                    && !self.square_is_attacked(castle_square)
                {
                    moves.push(Move::with_flag(king, castle_square, FLAG_CASTLING));
                }
            } else if target + 1 == king && file == 3 && state.has_castling_right(queenside_right) {
                let castle_square = target - 1;
                if board.squares[castle_square] == EMPTY
                    && board.squares[castle_square - 1] == EMPTY
                    && !self.square_is_attacked(castle_square)
                {
                    moves.push(Move::with_flag(king, castle_square, FLAG_CASTLING));
                }
            }
        }
    }

    // ========================================================================
    // SLIDERS AND KNIGHTS
    // ========================================================================

    fn generate_sliding_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let fi = self.friendly_index;
        for &sq in board.rooks[fi].squares() {
            self.generate_sliding_piece_moves(board, sq, ORTHOGONAL_DIRECTIONS, moves);
        }
        for &sq in board.bishops[fi].squares() {
            self.generate_sliding_piece_moves(board, sq, DIAGONAL_DIRECTIONS, moves);
        }
        for &sq in board.queens[fi].squares() {
            self.generate_sliding_piece_moves(board, sq, ALL_DIRECTIONS, moves);
        }
    }

    fn generate_sliding_piece_moves(
        &self,
        board: &Board,
        start: usize,
        directions: Range<usize>,
        moves: &mut Vec<Move>,
    ) {
        let is_pinned = self.is_pinned(start);

        // A pinned piece can never resolve a check
        if self.in_check && is_pinned {
            return;
        }

        for dir in directions {
            let edge = NUM_SQUARES_TO_EDGE[start][dir];
            if edge == 0 {
                continue;
            }
            if is_pinned && !aligned(self.friendly_king_square, start, step(start, dir, 1)) {
                continue;
            }

            for n in 1..=edge {
                let target = step(start, dir, n);
                let piece = board.squares[target];

                if is_color(piece, self.friendly_color) {
                    break;
                }
                let is_capture = piece != EMPTY;
                let prevents_check = self.square_is_in_check_ray(target);

                if (prevents_check || !self.in_check) && (!self.captures_only || is_capture) {
                    moves.push(Move::new(start, target));
                }

                // Blocked, or the check was just blocked so nothing further helps
                if is_capture || prevents_check {
                    break;
                }
            }
        }
    }

    fn generate_knight_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        for &start in board.knights[self.friendly_index].squares() {
            // A pinned knight can never stay on the pin ray
            if self.is_pinned(start) {
                continue;
            }

            let mut targets = KNIGHT_ATTACKS[start];
            while targets != 0 {
                let target = pop_lsb(&mut targets);
                let piece = board.squares[target];

                if is_color(piece, self.friendly_color) {
                    continue;
                }
                let is_capture = piece != EMPTY;
                if self.captures_only && !is_capture {
                    continue;
                }
                if self.in_check && !self.square_is_in_check_ray(target) {
                    continue;
                }
                moves.push(Move::new(start, target));
            }
        }
    }

    // ========================================================================
    // PAWNS
    // ========================================================================

    fn generate_pawn_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let white = board.white_to_move;
        let start_rank = if white { 1 } else { 6 };
        let rank_before_promotion = if white { 6 } else { 1 };
        let push_dir = if white { 0 } else { 1 };
        let king = self.friendly_king_square;
        let en_passant_square = board.en_passant_square();

        for &start in board.pawns[self.friendly_index].squares() {
            let rank = rank_of(start);
            let one_step_from_promotion = rank == rank_before_promotion;
            let is_pinned = self.is_pinned(start);

            // Pushes; promotions are emitted even in captures-only mode
            if !self.captures_only || one_step_from_promotion {
                let one_forward = step(start, push_dir, 1);

                if board.squares[one_forward] == EMPTY
                    && (!is_pinned || aligned(king, start, one_forward))
                {
                    if !self.in_check || self.square_is_in_check_ray(one_forward) {
                        if one_step_from_promotion {
                            self.make_promotion_moves(start, one_forward, moves);
                        } else {
                            moves.push(Move::new(start, one_forward));
                        }
                    }

                    if rank == start_rank && !self.captures_only {
                        let two_forward = step(one_forward, push_dir, 1);
                        if board.squares[two_forward] == EMPTY
                            && (!self.in_check || self.square_is_in_check_ray(two_forward))
                        {
                            moves.push(Move::with_flag(start, two_forward, FLAG_PAWN_TWO_FORWARD));
                        }
                    }
                }
            }

            // Captures
            for &dir in PAWN_ATTACK_DIRECTIONS[self.friendly_index].iter() {
                if NUM_SQUARES_TO_EDGE[start][dir] == 0 {
                    continue;
                }
                let target = step(start, dir, 1);

                if is_pinned && !aligned(king, start, target) {
                    continue;
                }

                if is_color(board.squares[target], self.opponent_color) {
                    if self.in_check && !self.square_is_in_check_ray(target) {
                        continue;
                    }
                    if one_step_from_promotion {
                        self.make_promotion_moves(start, target, moves);
                    } else {
                        moves.push(Move::new(start, target));
                    }
                }

                if Some(target) == en_passant_square {
                    let captured = if white { target - 8 } else { target + 8 };
                    if !self.in_check_after_en_passant(board, start, captured) {
                        moves.push(Move::with_flag(start, target, FLAG_EN_PASSANT));
                    }
                }
            }
        }
    }

    fn make_promotion_moves(&self, start: usize, target: usize, moves: &mut Vec<Move>) {
        moves.push(Move::with_flag(start, target, FLAG_PROMOTE_QUEEN));
        match self.promotions_to_generate {
            PromotionMode::All => {
                moves.push(Move::with_flag(start, target, FLAG_PROMOTE_KNIGHT));
                moves.push(Move::with_flag(start, target, FLAG_PROMOTE_ROOK));
                moves.push(Move::with_flag(start, target, FLAG_PROMOTE_BISHOP));
            }
            PromotionMode::QueenAndKnight => {
                moves.push(Move::with_flag(start, target, FLAG_PROMOTE_KNIGHT));
            }
            PromotionMode::QueenOnly => {}
        }
    }

    /// En passant removes two pawns from one rank at once, which the attack
    /// maps cannot anticipate. Probe the position as if both were gone.
    fn in_check_after_en_passant(&self, board: &Board, start: usize, captured: usize) -> bool {
        let king = self.friendly_king_square;

        if contains(self.opponent_attack_map_no_pawns, king) {
            return true;
        }

        // Horizontal rook/queen exposed by the two vacated squares
        if rank_of(captured) == rank_of(king) {
            let dir = if captured < king { 2 } else { 3 };
            for n in 1..=NUM_SQUARES_TO_EDGE[king][dir] {
                let sq = step(king, dir, n);
                if sq == start || sq == captured {
                    continue;
                }
                let piece = board.squares[sq];
                if piece == EMPTY {
                    continue;
                }
                if is_color(piece, self.opponent_color) && is_orthogonal_slider(piece) {
                    return true;
                }
                break;
            }
        }

        // Any enemy pawn still attacking the king once the captured one is gone
        let enemy_pawn = make_piece(PAWN, self.opponent_color);
        let mut attackers = PAWN_ATTACKS[self.friendly_index][king];
        while attackers != 0 {
            let sq = pop_lsb(&mut attackers);
            if sq != captured && board.squares[sq] == enemy_pawn {
                return true;
            }
        }

        false
    }

    // ========================================================================
    // ATTACK DATA
    // ========================================================================

    #[inline]
    fn is_pinned(&self, sq: usize) -> bool {
        self.pins_exist && contains(self.pin_ray_mask, sq)
    }

    #[inline]
    fn square_is_in_check_ray(&self, sq: usize) -> bool {
        self.in_check && contains(self.check_ray_mask, sq)
    }

    #[inline]
    fn square_is_attacked(&self, sq: usize) -> bool {
        contains(self.opponent_attack_map, sq)
    }

    fn add_check(&mut self, ray: u64) {
        self.check_ray_mask |= ray;
        self.in_double_check = self.in_check;
        self.in_check = true;
    }

    fn gen_sliding_attack_map(&mut self, board: &Board) {
        let oi = self.opponent_index;
        let mut map = 0u64;
        for &sq in board.rooks[oi].squares() {
            map |= self.sliding_attacks(board, sq, ORTHOGONAL_DIRECTIONS);
        }
        for &sq in board.bishops[oi].squares() {
            map |= self.sliding_attacks(board, sq, DIAGONAL_DIRECTIONS);
        }
        for &sq in board.queens[oi].squares() {
            map |= self.sliding_attacks(board, sq, ALL_DIRECTIONS);
        }
        self.opponent_sliding_attack_map = map;
    }

    /// Ray attacks that see through the friendly king, so the king cannot
    /// step backwards along a checking line
    fn sliding_attacks(&self, board: &Board, start: usize, directions: Range<usize>) -> u64 {
        let mut attacks = 0u64;
        for dir in directions {
            for n in 1..=NUM_SQUARES_TO_EDGE[start][dir] {
                let target = step(start, dir, n);
                attacks |= square_bb(target);
                if target != self.friendly_king_square && board.squares[target] != EMPTY {
                    break;
                }
            }
        }
        attacks
    }

    fn compute_attack_data(&mut self, board: &Board) {
        self.gen_sliding_attack_map(board);

        let oi = self.opponent_index;
        let king = self.friendly_king_square;

        // Only scan ray types the opponent can actually use
        let (mut first_dir, mut end_dir) = (0, 8);
        if board.queens[oi].is_empty() {
            first_dir = if board.rooks[oi].is_empty() { 4 } else { 0 };
            end_dir = if board.bishops[oi].is_empty() { 4 } else { 8 };
        }

        for dir in first_dir..end_dir {
            let is_diagonal = dir > 3;
            let mut friendly_along_ray = false;
            let mut ray_mask = 0u64;

            for n in 1..=NUM_SQUARES_TO_EDGE[king][dir] {
                let sq = step(king, dir, n);
                ray_mask |= square_bb(sq);
                let piece = board.squares[sq];
                if piece == EMPTY {
                    continue;
                }

                if is_color(piece, self.friendly_color) {
                    if friendly_along_ray {
                        // Two friendly pieces: no pin possible
                        break;
                    }
                    friendly_along_ray = true;
                    continue;
                }

                let can_attack_along_ray = if is_diagonal {
                    is_diagonal_slider(piece)
                } else {
                    is_orthogonal_slider(piece)
                };
                if can_attack_along_ray {
                    if friendly_along_ray {
                        self.pins_exist = true;
                        self.pin_ray_mask |= ray_mask;
                    } else {
                        self.add_check(ray_mask);
                    }
                }
                break;
            }

            // Only the king moves in double check, pins no longer matter
            if self.in_double_check {
                break;
            }
        }

        self.opponent_knight_attacks = 0;
        let mut knight_check = false;
        for &sq in board.knights[oi].squares() {
            self.opponent_knight_attacks |= KNIGHT_ATTACKS[sq];
            if !knight_check && contains(KNIGHT_ATTACKS[sq], king) {
                knight_check = true;
                self.add_check(square_bb(sq));
            }
        }

        self.opponent_pawn_attack_map = 0;
        let mut pawn_check = false;
        for &sq in board.pawns[oi].squares() {
            let attacks = PAWN_ATTACKS[oi][sq];
            self.opponent_pawn_attack_map |= attacks;
            if !pawn_check && contains(attacks, king) {
                pawn_check = true;
                self.add_check(square_bb(sq));
            }
        }

        let enemy_king = board.king_squares[oi];
        self.opponent_attack_map_no_pawns = self.opponent_sliding_attack_map
            | self.opponent_knight_attacks
            | KING_ATTACKS[enemy_king];
        self.opponent_attack_map =
            self.opponent_attack_map_no_pawns | self.opponent_pawn_attack_map;
    }
}

/// True if `mv` is among the legal moves of the position, flag included
pub fn is_legal(board: &Board, mv: Move) -> bool {
    !mv.is_null() && MoveGenerator::new().generate_moves(board, false).contains(&mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perft::perft;

    fn legal(fen: &str) -> Vec<String> {
        let board = Board::from_fen(fen).unwrap();
        let mut moves: Vec<String> = MoveGenerator::new()
            .generate_moves(&board, false)
            .iter()
            .map(|m| m.to_uci())
            .collect();
        moves.sort();
        moves
    }

    #[test]
    fn test_start_position_has_twenty_moves() {
        let board = Board::start_position();
        let mut gen = MoveGenerator::new();
        assert_eq!(gen.generate_moves(&board, false).len(), 20);
        assert!(!gen.in_check());
        assert_eq!(gen.generate_moves(&board, true).len(), 0);
    }

    #[test]
    fn test_double_check_allows_only_king_moves() {
        // Rook e8 and bishop b4 both check the king on e1
        let moves = legal("4r2k/8/8/8/1b6/8/8/N3K3 w - - 0 1");
        assert!(moves.iter().all(|m| m.starts_with("e1")), "{:?}", moves);
        assert!(!moves.is_empty());
    }

    #[test]
    fn test_single_check_requires_block_or_capture() {
        // Rook e8 checks: the knight may capture it, the bishop may block on e2
        let moves = legal("4r2k/2N5/8/8/8/8/8/3BK3 w - - 0 1");
        assert!(moves.contains(&"c7e8".to_string()));
        assert!(moves.contains(&"d1e2".to_string()));
        assert!(!moves.contains(&"c7a6".to_string()));
        assert!(!moves.contains(&"d1c2".to_string()));
    }

    #[test]
    fn test_king_cannot_retreat_along_check_ray() {
        let moves = legal("4r2k/8/8/8/8/8/4K3/8 w - - 0 1");
        assert!(!moves.contains(&"e2e1".to_string()));
        assert!(!moves.contains(&"e2e3".to_string()));
        assert!(moves.contains(&"e2d2".to_string()));
    }

    #[test]
    fn test_pinned_pieces() {
        // Knight d2 pinned by bishop a5, rook e2 pinned by rook e8
        let moves = legal("4r2k/8/8/b7/8/8/3NR3/4K3 w - - 0 1");
        assert!(!moves.iter().any(|m| m.starts_with("d2")));
        assert!(moves.contains(&"e2e8".to_string()));
        assert!(moves.contains(&"e2e5".to_string()));
        assert!(!moves.contains(&"e2d2".to_string()));
        assert!(!moves.contains(&"e2f2".to_string()));
    }

    #[test]
    fn test_pinned_pawn_may_capture_pinner() {
        // Pawn d2 pinned diagonally by bishop c3 can take it
        let moves = legal("7k/8/8/8/8/2b5/3P4/4K3 w - - 0 1");
        assert!(moves.contains(&"d2c3".to_string()));
        assert!(!moves.contains(&"d2d3".to_string()));
        assert!(!moves.contains(&"d2d4".to_string()));
    }

    #[test]
    fn test_castling_rules() {
        let moves = legal("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        // f1 attacked by the bishop on c4: no kingside castling
        let moves = legal("r3k2r/8/8/8/2b5/8/8/R3K2R w KQkq - 0 1");
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        // b1 occupied blocks the queenside
        let moves = legal("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
        assert!(!moves.contains(&"e1c1".to_string()));

        // never out of check
        let moves = legal("r3k2r/8/8/8/8/8/4q3/R3K2R w KQkq - 0 1");
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(!moves.contains(&"e1c1".to_string()));
    }

    #[test]
    fn test_en_passant_horizontal_pin() {
        // Taking on d6 would expose the king on a5 to the rook on h5
        let moves = legal("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1");
        assert!(!moves.contains(&"e5d6".to_string()));

        let moves = legal("8/8/8/K2pP3/8/8/8/7k w - d6 0 1");
        assert!(moves.contains(&"e5d6".to_string()));
    }

    #[test]
    fn test_en_passant_removes_checking_pawn() {
        // Black pawn d5 checks the king on e4, en passant captures it
        let moves = legal("7k/8/8/3pP3/4K3/8/8/8 w - d6 0 1");
        assert!(moves.contains(&"e5d6".to_string()));
    }

    #[test]
    fn test_promotion_modes() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        let board = Board::from_fen(fen).unwrap();
        let count = |mode| {
            MoveGenerator::with_promotions(mode)
                .generate_moves(&board, false)
                .iter()
                .filter(|m| m.is_promotion())
                .count()
        };
        assert_eq!(count(PromotionMode::All), 4);
        assert_eq!(count(PromotionMode::QueenAndKnight), 2);
        assert_eq!(count(PromotionMode::QueenOnly), 1);
    }

    #[test]
    fn test_captures_only_keeps_captures_and_promotions() {
        let board = Board::from_fen("3r4/4P3/8/3p4/8/4N3/k7/4K3 w - - 0 1").unwrap();
        let mut moves: Vec<String> = MoveGenerator::new()
            .generate_moves(&board, true)
            .iter()
            .map(|m| m.to_uci())
            .collect();
        moves.sort();
        let expected = [
            "e3d5", "e7d8b", "e7d8n", "e7d8q", "e7d8r", "e7e8b", "e7e8n", "e7e8q", "e7e8r",
        ];
        assert_eq!(moves, expected);
    }

    #[test]
    fn test_check_detection() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2q w - - 0 1").unwrap();
        assert!(board.is_in_check());
        let board = Board::from_fen("4k3/8/8/8/8/5n2/8/4K3 w - - 0 1").unwrap();
        assert!(board.is_in_check());
        let board = Board::start_position();
        assert!(!board.is_in_check());
    }

    #[test]
    fn test_small_perft() {
        let mut board = Board::start_position();
        assert_eq!(perft(&mut board, 3), 8902);
    }
}
