//! Gambit - Chess Engine Core
//!
//! A chess engine library with:
//! - Full legal move generation (pins, checks, en passant, castling, promotions)
//! - Reversible make/unmake with incremental Zobrist hashing
//! - Iterative deepening alpha-beta search with quiescence and a transposition table
//! - Depth-staggered parallel search sharing one table
//! - An engine controller with timed, cancellable background thinking
//! - A UCI front end

pub mod error;
pub mod types;
pub mod moves;
pub mod bitboard;
pub mod piece_list;
pub mod zobrist;
pub mod fen;
pub mod board;
pub mod move_generator;
pub mod perft;
pub mod evaluation;
pub mod move_ordering;
pub mod transposition;
pub mod search;
pub mod parallel_search;
pub mod arbiter;
pub mod opening_book;
pub mod config;
pub mod engine;
pub mod uci;

pub use board::Board;
pub use engine::Engine;
pub use error::{ChessError, Result};
pub use moves::Move;
