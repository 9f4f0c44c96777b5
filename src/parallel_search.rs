//! Gambit - Parallel Search Module
//!
//! Depth-staggered root search: worker `i` searches the position to fixed
//! depth `i + 1` on its own board copy and move generator. The only shared
//! state is the transposition table behind one lock. The answer comes from
//! the deepest worker that finished uncancelled with a move.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::thread;

use tracing::{debug, warn};

use crate::board::Board;
use crate::move_generator::PromotionMode;
use crate::moves::Move;
use crate::search::{
    root_moves, SearchResult, SearchStrategy, SearchWorker, SharedTable, MAX_SEARCH_DEPTH,
};
use crate::transposition::TranspositionTable;

/// Upper bound on worker threads
pub const MAX_THREADS: usize = 64;

/// What one worker brings back
#[derive(Clone, Copy, Debug)]
struct WorkerReport {
    depth: u32,
    best_move: Move,
    eval: i32,
    nodes: u64,
    completed: bool,
}

#[derive(Clone, Debug)]
pub struct ParallelSearch {
    pub threads: usize,
    pub promotions: PromotionMode,
}

impl ParallelSearch {
    pub fn new(threads: usize, promotions: PromotionMode) -> Self {
        let threads = if threads == 0 { num_cpus::get() } else { threads };
        ParallelSearch {
            threads: threads.clamp(1, MAX_THREADS),
            promotions,
        }
    }

    pub fn search(
        &self,
        board: &Board,
        table: &Mutex<TranspositionTable>,
        stop: &AtomicBool,
    ) -> SearchResult {
        let (moves, in_check) = root_moves(board, self.promotions);
        let Some(&first_move) = moves.first() else {
            return SearchResult::terminal(in_check);
        };

        let workers = self.threads.min(MAX_SEARCH_DEPTH as usize);
        let promotions = self.promotions;

        let reports: Vec<WorkerReport> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|index| {
                    let mut local_board = board.clone();
                    scope.spawn(move || {
                        let depth = index as u32 + 1;
                        let mut worker = SearchWorker::new(SharedTable(table), stop, promotions);
                        worker.search_root(&mut local_board, depth);
                        WorkerReport {
                            depth,
                            best_move: worker.best_move_this_iteration,
                            eval: worker.best_eval_this_iteration,
                            nodes: worker.nodes,
                            completed: !worker.is_cancelled(),
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(report) => Some(report),
                    Err(_) => {
                        warn!("search worker panicked");
                        None
                    }
                })
                .collect()
        });

        let mut result = SearchResult {
            best_move: Move::NULL,
            eval: 0,
            depth: 0,
            nodes: reports.iter().map(|r| r.nodes).sum(),
            cancelled: reports.iter().any(|r| !r.completed),
            fallback: false,
        };

        for report in &reports {
            if report.completed && !report.best_move.is_null() && report.depth > result.depth {
                result.best_move = report.best_move;
                result.eval = report.eval;
                result.depth = report.depth;
                debug!(
                    depth = report.depth,
                    best_move = %report.best_move,
                    eval = report.eval,
                    nodes = report.nodes,
                    "worker complete"
                );
            }
        }

        if result.best_move.is_null() {
            result.best_move = first_move;
            result.fallback = true;
        }
        result.log_completion();
        result
    }
}

impl Default for ParallelSearch {
    fn default() -> Self {
        ParallelSearch::new(0, PromotionMode::QueenAndKnight)
    }
}

impl SearchStrategy for ParallelSearch {
    fn run(
        &mut self,
        board: &Board,
        table: &Mutex<TranspositionTable>,
        stop: &AtomicBool,
    ) -> SearchResult {
        self.search(board, table, stop)
    }
}
