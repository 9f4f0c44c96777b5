//! Gambit - Search Module
//!
//! Negamax with fail-hard alpha-beta pruning:
//! - Iterative deepening from depth 1, adopting only completed iterations
//! - Mate distance pruning
//! - Transposition table probes and stores
//! - Quiescence search over captures at the horizon
//! - Check and pawn-to-seventh extensions
//! - Cooperative cancellation through a shared flag
//!
//! The node logic is written once against `TableAccess`, so the serial
//! searcher (exclusive table) and the parallel one (locked table) share it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::board::Board;
use crate::evaluation::evaluate;
use crate::move_generator::{MoveGenerator, PromotionMode};
use crate::move_ordering::MoveOrdering;
use crate::moves::Move;
use crate::transposition::{
    is_mate_score, ply_to_mate, Bound, TranspositionTable, IMMEDIATE_MATE_SCORE,
};
use crate::types::*;

pub const POSITIVE_INFINITY: i32 = 9_999_999;
pub const NEGATIVE_INFINITY: i32 = -POSITIVE_INFINITY;

/// Total extra plies one line may gain from extensions
pub const MAX_EXTENSIONS: u32 = 16;

/// Iterative deepening ceiling
pub const MAX_SEARCH_DEPTH: u32 = 256;

// ============================================================================
// TABLE ACCESS
// ============================================================================

/// How a search node reaches the transposition table
pub trait TableAccess {
    fn lookup(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        alpha: i32,
        beta: i32,
    ) -> Option<i32>;
    fn store(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        value: i32,
        bound: Bound,
        mv: Move,
    );
    fn stored_move(&mut self, key: u64) -> Move;
}

impl TableAccess for &mut TranspositionTable {
    fn lookup(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        alpha: i32,
        beta: i32,
    ) -> Option<i32> {
        TranspositionTable::lookup(self, key, depth, ply_from_root, alpha, beta)
    }

    fn store(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        value: i32,
        bound: Bound,
        mv: Move,
    ) {
        TranspositionTable::store(self, key, depth, ply_from_root, value, bound, mv)
    }

    fn stored_move(&mut self, key: u64) -> Move {
        TranspositionTable::stored_move(self, key)
    }
}

/// A table shared between threads. Every probe and store takes the lock.
pub struct SharedTable<'a>(pub &'a Mutex<TranspositionTable>);

impl SharedTable<'_> {
    fn lock(&self) -> MutexGuard<'_, TranspositionTable> {
        lock_table(self.0)
    }
}

impl TableAccess for SharedTable<'_> {
    fn lookup(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        alpha: i32,
        beta: i32,
    ) -> Option<i32> {
        self.lock().lookup(key, depth, ply_from_root, alpha, beta)
    }

    fn store(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        value: i32,
        bound: Bound,
        mv: Move,
    ) {
        self.lock().store(key, depth, ply_from_root, value, bound, mv)
    }

    fn stored_move(&mut self, key: u64) -> Move {
        self.lock().stored_move(key)
    }
}

/// Lock the table, taking it over from a panicked holder. Entries are only
/// ever hints, so a half-finished store cannot break a search.
pub fn lock_table(table: &Mutex<TranspositionTable>) -> MutexGuard<'_, TranspositionTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// SEARCH RESULT
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// `Move::NULL` only when the side to move has no legal move
    pub best_move: Move,
    pub eval: i32,
    /// Deepest completed iteration, 0 if none completed
    pub depth: u32,
    pub nodes: u64,
    pub cancelled: bool,
    /// No iteration completed, so the first legal move was played
    pub fallback: bool,
}

impl SearchResult {
    /// Result for a position with nothing to search
    pub(crate) fn terminal(in_check: bool) -> Self {
        SearchResult {
            best_move: Move::NULL,
            eval: if in_check { -IMMEDIATE_MATE_SCORE } else { 0 },
            depth: 0,
            nodes: 0,
            cancelled: false,
            fallback: false,
        }
    }

    pub(crate) fn log_completion(&self) {
        info!(
            best_move = %self.best_move,
            eval = self.eval,
            depth = self.depth,
            nodes = self.nodes,
            cancelled = self.cancelled,
            fallback = self.fallback,
            "search complete"
        );
    }
}

/// A root search over one position. Serial and parallel variants are
/// picked by configuration.
pub trait SearchStrategy: Send {
    fn run(
        &mut self,
        board: &Board,
        table: &Mutex<TranspositionTable>,
        stop: &AtomicBool,
    ) -> SearchResult;
}

// ============================================================================
// SEARCH WORKER
// ============================================================================

/// Per-thread search state: scratch generator, ordering buffer and a handle
/// to the table. The board is passed down the recursion.
pub struct SearchWorker<'a, T: TableAccess> {
    generator: MoveGenerator,
    ordering: MoveOrdering,
    table: T,
    stop: &'a AtomicBool,

    /// Best move of the previous iteration, searched first at the root
    pub best_move: Move,
    pub best_move_this_iteration: Move,
    pub best_eval_this_iteration: i32,
    pub nodes: u64,
}

impl<'a, T: TableAccess> SearchWorker<'a, T> {
    pub fn new(table: T, stop: &'a AtomicBool, promotions: PromotionMode) -> Self {
        SearchWorker {
            generator: MoveGenerator::with_promotions(promotions),
            ordering: MoveOrdering::new(),
            table,
            stop,
            best_move: Move::NULL,
            best_move_this_iteration: Move::NULL,
            best_eval_this_iteration: NEGATIVE_INFINITY,
            nodes: 0,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// One full-window search of the root to `depth`
    pub fn search_root(&mut self, board: &mut Board, depth: u32) -> i32 {
        self.best_move_this_iteration = Move::NULL;
        self.best_eval_this_iteration = NEGATIVE_INFINITY;
        self.search(board, depth, 0, NEGATIVE_INFINITY, POSITIVE_INFINITY, 0)
    }

    fn search(
        &mut self,
        board: &mut Board,
        depth: u32,
        ply: u32,
        mut alpha: i32,
        mut beta: i32,
        num_extensions: u32,
    ) -> i32 {
        if self.is_cancelled() {
            return 0;
        }
        self.nodes += 1;

        if ply > 0 {
            // A single earlier occurrence already counts as a draw here
            if board.repetition_history.contains(&board.zobrist_key) {
                return 0;
            }

            // Mate distance pruning
            alpha = alpha.max(-IMMEDIATE_MATE_SCORE + ply as i32);
            beta = beta.min(IMMEDIATE_MATE_SCORE - ply as i32);
            if alpha >= beta {
                return alpha;
            }
        }

        let key = board.zobrist_key;
        if let Some(value) = self.table.lookup(key, depth, ply, alpha, beta) {
            if ply == 0 {
                self.best_move_this_iteration = self.table.stored_move(key);
                self.best_eval_this_iteration = value;
            }
            return value;
        }

        if depth == 0 {
            return self.quiescence(board, alpha, beta);
        }

        let mut moves = self.generator.generate_moves(board, false);
        let in_check = self.generator.in_check();
        let pawn_attacks = self.generator.opponent_pawn_attack_map();

        if moves.is_empty() {
            return if in_check {
                -(IMMEDIATE_MATE_SCORE - ply as i32)
            } else {
                0
            };
        }

        let hash_move = if ply == 0 {
            self.best_move
        } else {
            self.table.stored_move(key)
        };
        self.ordering.order_moves(hash_move, board, &mut moves, pawn_attacks);

        let mut bound = Bound::UpperBound;
        let mut best_move_in_position = Move::NULL;

        for mv in moves {
            let moved_piece_type = piece_type(board.squares[mv.start()]);
            board.make_move(mv, true);
            let extension = self.extension(board, mv, moved_piece_type, num_extensions);
            let eval = -self.search(
                board,
                depth - 1 + extension,
                ply + 1,
                -beta,
                -alpha,
                num_extensions + extension,
            );
            board.unmake_move(mv, true);

            if self.is_cancelled() {
                return 0;
            }

            if eval >= beta {
                self.table.store(key, depth, ply, beta, Bound::LowerBound, mv);
                return beta;
            }

            if eval > alpha {
                bound = Bound::Exact;
                best_move_in_position = mv;
                alpha = eval;
                if ply == 0 {
                    self.best_move_this_iteration = mv;
                    self.best_eval_this_iteration = eval;
                }
            }
        }

        self.table.store(key, depth, ply, alpha, bound, best_move_in_position);
        alpha
    }

    /// Captures-only search until the position is quiet
    fn quiescence(&mut self, board: &mut Board, mut alpha: i32, beta: i32) -> i32 {
        if self.is_cancelled() {
            return 0;
        }
        self.nodes += 1;

        // Standing pat: the side to move is not forced to capture
        let eval = evaluate(board);
        if eval >= beta {
            return beta;
        }
        if eval > alpha {
            alpha = eval;
        }

        let mut moves = self.generator.generate_moves(board, true);
        let pawn_attacks = self.generator.opponent_pawn_attack_map();
        self.ordering.order_moves(Move::NULL, board, &mut moves, pawn_attacks);

        for mv in moves {
            board.make_move(mv, true);
            let eval = -self.quiescence(board, -beta, -alpha);
            board.unmake_move(mv, true);

            if eval >= beta {
                return beta;
            }
            if eval > alpha {
                alpha = eval;
            }
        }

        alpha
    }

    /// One extra ply for checks and pawns reaching the seventh rank.
    /// Called with `mv` already made.
    fn extension(
        &mut self,
        board: &Board,
        mv: Move,
        moved_piece_type: u8,
        num_extensions: u32,
    ) -> u32 {
        if num_extensions >= MAX_EXTENSIONS {
            return 0;
        }
        if self.generator.is_in_check(board) {
            return 1;
        }
        let target_rank = rank_of(mv.target());
        if moved_piece_type == PAWN && (target_rank == 6 || target_rank == 1) {
            return 1;
        }
        0
    }
}

/// Root moves in generation order, plus whether the side to move is in check
pub(crate) fn root_moves(board: &Board, promotions: PromotionMode) -> (Vec<Move>, bool) {
    let mut generator = MoveGenerator::with_promotions(promotions);
    let moves = generator.generate_moves(board, false);
    (moves, generator.in_check())
}

// ============================================================================
// SERIAL SEARCH
// ============================================================================

/// Single-threaded iterative deepening
#[derive(Clone, Debug)]
pub struct SerialSearch {
    pub max_depth: u32,
    pub promotions: PromotionMode,
}

impl SerialSearch {
    pub fn new(max_depth: u32, promotions: PromotionMode) -> Self {
        SerialSearch {
            max_depth: max_depth.clamp(1, MAX_SEARCH_DEPTH),
            promotions,
        }
    }

    /// Search with an exclusively held table
    pub fn search(
        &self,
        board: &Board,
        table: &mut TranspositionTable,
        stop: &AtomicBool,
    ) -> SearchResult {
        let (moves, in_check) = root_moves(board, self.promotions);
        let Some(&first_move) = moves.first() else {
            return SearchResult::terminal(in_check);
        };

        let mut board = board.clone();
        let mut worker = SearchWorker::new(table, stop, self.promotions);
        let mut result = SearchResult {
            best_move: Move::NULL,
            eval: 0,
            depth: 0,
            nodes: 0,
            cancelled: false,
            fallback: false,
        };

        for depth in 1..=self.max_depth {
            worker.search_root(&mut board, depth);

            if worker.is_cancelled() {
                result.cancelled = true;
                break;
            }

            if !worker.best_move_this_iteration.is_null() {
                worker.best_move = worker.best_move_this_iteration;
                result.best_move = worker.best_move_this_iteration;
                result.eval = worker.best_eval_this_iteration;
                result.depth = depth;
                debug!(
                    depth,
                    best_move = %result.best_move,
                    eval = result.eval,
                    nodes = worker.nodes,
                    "iteration complete"
                );

                // A forced mate inside the horizon will not change with depth
                if is_mate_score(result.eval) && ply_to_mate(result.eval) as u32 <= depth {
                    break;
                }
            }
        }

        result.nodes = worker.nodes;
        if result.best_move.is_null() {
            result.best_move = first_move;
            result.fallback = true;
        }
        result.log_completion();
        result
    }
}

impl Default for SerialSearch {
    fn default() -> Self {
        SerialSearch::new(MAX_SEARCH_DEPTH, PromotionMode::QueenAndKnight)
    }
}

impl SearchStrategy for SerialSearch {
    fn run(
        &mut self,
        board: &Board,
        table: &Mutex<TranspositionTable>,
        stop: &AtomicBool,
    ) -> SearchResult {
        let mut guard = lock_table(table);
        self.search(board, &mut guard, stop)
    }
}
