//! Gambit - Engine Controller
//!
//! The command surface a game loop or protocol front end drives: new game,
//! set position, make move, start and stop thinking, and position queries.
//!
//! Thinking runs on a background thread against a copy of the board. A
//! timer thread ends it after the budget by raising the stop flag. Every
//! search gets a fresh id; timers and completion callbacks act only while
//! their id is still current, so a superseded search stays silent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::arbiter::{self, GameResult};
use crate::board::Board;
use crate::config::EngineConfig;
use crate::error::{ChessError, Result};
use crate::fen::{self, EnPassantPolicy};
use crate::move_generator::is_legal;
use crate::moves::Move;
use crate::opening_book::{NoBook, OpeningBook};
use crate::search::lock_table;
use crate::transposition::TranspositionTable;

pub struct Engine {
    config: EngineConfig,
    board: Board,
    book: Box<dyn OpeningBook>,
    table: Arc<Mutex<TranspositionTable>>,

    search_id: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    search_thread: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine::with_book(config, Box::new(NoBook))
    }

    pub fn with_book(config: EngineConfig, book: Box<dyn OpeningBook>) -> Self {
        let table = TranspositionTable::new(config.tt_entries);
        Engine {
            config,
            board: Board::start_position(),
            book,
            table: Arc::new(Mutex::new(table)),
            search_id: Arc::new(AtomicU64::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
            search_thread: None,
        }
    }

    // ========================================================================
    // GAME CONTROL
    // ========================================================================

    /// Back to the start position with an empty transposition table
    pub fn new_game(&mut self) {
        self.cancel_search();
        self.board = Board::start_position();
        lock_table(&self.table).clear();
        info!("new game");
    }

    /// Load a FEN. On error the current position is kept.
    pub fn set_position(&mut self, fen: &str) -> Result<()> {
        self.cancel_search();
        self.board.load_fen(fen)?;
        debug!(fen, "position set");
        Ok(())
    }

    /// Play a move given in coordinate notation, if it is legal here
    pub fn make_move(&mut self, uci: &str) -> Result<Move> {
        self.cancel_search();
        let mv = Move::from_uci(uci, &self.board)?;
        if !is_legal(&self.board, mv) {
            return Err(ChessError::IllegalMove(uci.to_string()));
        }
        self.board.make_move(mv, false);
        Ok(mv)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration. A new table size discards the table.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.cancel_search();
        if config.tt_entries != self.config.tt_entries {
            *lock_table(&self.table) = TranspositionTable::new(config.tt_entries);
        }
        self.config = config;
    }

    pub fn clear_hash(&mut self) {
        self.cancel_search();
        lock_table(&self.table).clear();
    }

    // ========================================================================
    // THINKING
    // ========================================================================

    /// Think for the configured time and hand the chosen move to `on_move`
    pub fn start_thinking<F>(&mut self, on_move: F)
    where
        F: FnOnce(Move) + Send + 'static,
    {
        let budget = self.config.think_time;
        self.start_thinking_for(budget, on_move);
    }

    /// Think for `budget`. The callback runs once on a background thread,
    /// unless this search is superseded first. It receives `Move::NULL`
    /// only if the side to move has no legal move.
    pub fn start_thinking_for<F>(&mut self, budget: Duration, on_move: F)
    where
        F: FnOnce(Move) + Send + 'static,
    {
        self.cancel_search();
        let id = self.search_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.stop.store(false, Ordering::SeqCst);

        if let Some(mv) = self.book_move() {
            info!(book_move = %mv, "playing book move");
            let token = Arc::clone(&self.search_id);
            self.search_thread = Some(thread::spawn(move || {
                if token.load(Ordering::SeqCst) == id {
                    on_move(mv);
                }
            }));
            return;
        }

        let board = self.board.clone();
        let table = Arc::clone(&self.table);
        let stop = Arc::clone(&self.stop);
        let token = Arc::clone(&self.search_id);
        let mut strategy = self.config.strategy();

        // Dropping the sender on completion wakes the timer early
        let (done_tx, done_rx) = mpsc::channel::<()>();
        {
            let stop = Arc::clone(&self.stop);
            let token = Arc::clone(&self.search_id);
            thread::spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(budget) {
                    if token.load(Ordering::SeqCst) == id {
                        debug!(search_id = id, "time up");
                        stop.store(true, Ordering::SeqCst);
                    }
                }
            });
        }

        debug!(search_id = id, budget_ms = budget.as_millis() as u64, "search started");
        self.search_thread = Some(thread::spawn(move || {
            let result = strategy.run(&board, &table, &stop);
            drop(done_tx);

            if result.best_move.is_null() {
                warn!("no legal move in the searched position");
            } else {
                let legal = is_legal(&board, result.best_move);
                if !legal {
                    error!(best_move = %result.best_move, "search chose an illegal move");
                }
                debug_assert!(legal, "search chose an illegal move {}", result.best_move);
            }

            if token.load(Ordering::SeqCst) == id {
                on_move(result.best_move);
            } else {
                debug!(search_id = id, "superseded search result dropped");
            }
        }));
    }

    /// End the live search early. Its callback still fires with the best
    /// move found so far.
    pub fn stop_thinking(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_thinking(&self) -> bool {
        self.search_thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Block until the live search has delivered its move
    pub fn wait(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            if handle.join().is_err() {
                error!("search thread panicked");
            }
        }
    }

    /// Abandon any live search without delivering its move
    pub fn quit(&mut self) {
        self.cancel_search();
    }

    fn cancel_search(&mut self) {
        // Bump the id first so the superseded search stays silent
        self.search_id.fetch_add(1, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
        self.wait();
    }

    fn book_move(&self) -> Option<Move> {
        if self.board.ply_count > self.config.max_book_ply {
            return None;
        }
        let uci = self.book.book_move(&self.board)?;
        match Move::from_uci(&uci, &self.board) {
            Ok(mv) if is_legal(&self.board, mv) => Some(mv),
            _ => {
                warn!(book_move = %uci, "ignoring illegal book move");
                None
            }
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_squares(&self) -> [u8; 64] {
        self.board.squares
    }

    pub fn current_fen(&self) -> String {
        fen::current_fen(&self.board, EnPassantPolicy::Always)
    }

    pub fn current_fen_with(&self, policy: EnPassantPolicy) -> String {
        fen::current_fen(&self.board, policy)
    }

    pub fn game_result(&self) -> GameResult {
        arbiter::game_state(&self.board)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel_search();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_FEN;
    use crate::opening_book::BookTable;

    #[test]
    fn test_make_move_checks_legality() {
        let mut engine = Engine::default();
        assert!(engine.make_move("e2e4").is_ok());
        assert!(matches!(engine.make_move("e2e4"), Err(ChessError::IllegalMove(_))));
        assert!(matches!(engine.make_move("e9e5"), Err(ChessError::InvalidMoveString(_))));
        assert!(engine.make_move("e7e5").is_ok());
        assert_eq!(
            engine.current_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn test_set_position_keeps_board_on_error() {
        let mut engine = Engine::default();
        assert!(engine.set_position("8/8/8 w - - 0 1").is_err());
        assert_eq!(engine.current_fen(), STARTING_FEN);
        assert_eq!(engine.board_squares(), Board::start_position().squares);
    }

    #[test]
    fn test_book_move_is_played_when_in_range() {
        let book = BookTable::from_lines("g1f3 d7d5", 3).unwrap();
        let mut engine = Engine::with_book(EngineConfig::default(), Box::new(book));
        let (tx, rx) = mpsc::channel();
        engine.start_thinking_for(Duration::from_secs(30), move |mv| {
            let _ = tx.send(mv);
        });
        let mv = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(mv.to_uci(), "g1f3");
    }

    #[test]
    fn test_book_ignored_past_max_ply() {
        let book = BookTable::from_lines("g1f3 d7d5", 3).unwrap();
        let config = EngineConfig {
            max_book_ply: 0,
            max_depth: 1,
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_book(config, Box::new(book));
        engine.make_move("g1f3").unwrap();
        // Ply 1 is past the book, so the reply comes from search
        assert!(engine.book_move().is_none());
    }

    #[test]
    fn test_game_result_tracks_position() {
        let mut engine = Engine::default();
        assert_eq!(engine.game_result(), GameResult::InProgress);
        for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            engine.make_move(uci).unwrap();
        }
        assert_eq!(engine.game_result(), GameResult::WhiteIsMated);
    }
}
