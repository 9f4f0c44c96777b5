//! Gambit - Opening Book Module
//!
//! Book moves keyed by Zobrist hash. The engine asks the book before it
//! starts a search, never during one.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rand::prelude::*;

use crate::board::Board;
use crate::error::{ChessError, Result};
use crate::move_generator::is_legal;
use crate::moves::Move;

/// Source of opening moves in coordinate notation
pub trait OpeningBook: Send {
    fn book_move(&self, board: &Board) -> Option<String>;
}

/// A book that never knows a move
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBook;

impl OpeningBook for NoBook {
    fn book_move(&self, _board: &Board) -> Option<String> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookMove {
    pub uci: String,
    pub weight: u32,
}

/// In-memory book with weighted random choice between candidates
#[derive(Debug)]
pub struct BookTable {
    by_key: HashMap<u64, Vec<BookMove>>,
    rng: Mutex<StdRng>,
}

impl BookTable {
    pub fn new(seed: u64) -> Self {
        BookTable {
            by_key: HashMap::new(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build from lines of space-separated moves played from the start
    /// position, each optionally followed by a tab and a weight.
    ///
    /// ```text
    /// e2e4 e7e5 g1f3	10
    /// d2d4 d7d5
    /// ```
    pub fn from_lines(text: &str, seed: u64) -> Result<Self> {
        let mut book = BookTable::new(seed);
        let lines = text.lines().map(str::trim);
        for line in lines.filter(|l| !l.is_empty() && !l.starts_with('#')) {
            let (sequence, weight) = match line.split_once('\t') {
                Some((moves, w)) => {
                    let weight = w.trim().parse::<u32>().map_err(|_| {
                        ChessError::InvalidMoveString(format!("bad book weight in '{}'", line))
                    })?;
                    (moves, weight)
                }
                None => (line, 1),
            };

            let mut board = Board::start_position();
            for token in sequence.split_whitespace() {
                let mv = Move::from_uci(token, &board)?;
                if !is_legal(&board, mv) {
                    let context = format!("{} in book line '{}'", token, line);
                    return Err(ChessError::IllegalMove(context));
                }
                book.add(board.zobrist_key, token, weight);
                board.make_move(mv, false);
            }
        }
        Ok(book)
    }

    /// Add weight to a candidate move for the position with `key`
    pub fn add(&mut self, key: u64, uci: &str, weight: u32) {
        let candidates = self.by_key.entry(key).or_default();
        match candidates.iter_mut().find(|m| m.uci == uci) {
            Some(existing) => existing.weight = existing.weight.saturating_add(weight.max(1)),
            None => candidates.push(BookMove {
                uci: uci.to_string(),
                weight: weight.max(1),
            }),
        }
    }

    pub fn moves_for(&self, board: &Board) -> Option<&[BookMove]> {
        self.by_key.get(&board.zobrist_key).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl OpeningBook for BookTable {
    fn book_move(&self, board: &Board) -> Option<String> {
        let moves = self.moves_for(board)?;
        let total_weight: u64 = moves.iter().map(|m| u64::from(m.weight)).sum();
        if total_weight == 0 {
            return moves.first().map(|m| m.uci.clone());
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pick = rng.gen_range(0..total_weight);
        for m in moves {
            let w = u64::from(m.weight);
            if pick < w {
                return Some(m.uci.clone());
            }
            pick -= w;
        }
        moves.first().map(|m| m.uci.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINES: &str = "e2e4 e7e5 g1f3\t4\n# comment\n\nd2d4 d7d5\t1\ne2e4 c7c5\n";

    #[test]
    fn test_indexes_every_position_on_each_line() {
        let book = BookTable::from_lines(LINES, 7).unwrap();
        let start = Board::start_position();
        let root = book.moves_for(&start).unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root.iter().find(|m| m.uci == "e2e4").map(|m| m.weight), Some(5));

        let mut board = start.clone();
        board.make_move(Move::from_uci("e2e4", &board).unwrap(), false);
        let replies: Vec<&str> =
            book.moves_for(&board).unwrap().iter().map(|m| m.uci.as_str()).collect();
        assert_eq!(replies, vec!["e7e5", "c7c5"]);
    }

    #[test]
    fn test_weighted_choice_stays_in_book() {
        let book = BookTable::from_lines(LINES, 7).unwrap();
        let start = Board::start_position();
        for _ in 0..20 {
            let mv = book.book_move(&start).unwrap();
            assert!(mv == "e2e4" || mv == "d2d4");
        }
    }

    #[test]
    fn test_unknown_position_has_no_move() {
        let book = BookTable::from_lines(LINES, 7).unwrap();
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(book.book_move(&board), None);
        assert_eq!(NoBook.book_move(&board), None);
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(BookTable::from_lines("e2e5", 1).is_err());
        assert!(BookTable::from_lines("e2e4\tmany", 1).is_err());
        assert!(BookTable::from_lines("zz", 1).is_err());
    }
}
