//! Gambit - Transposition Table Module
//!
//! Fixed-size, always-replace table indexed by `key % capacity`. Entries keep
//! the full Zobrist key, so a slot belonging to another position is a miss.
//! Mate scores are stored relative to the node that produced them and
//! re-biased by the ply distance from the root on the way in and out.

use crate::moves::Move;

/// Entries in a table built with `Default`
pub const DEFAULT_ENTRIES: usize = 64_000;

pub const IMMEDIATE_MATE_SCORE: i32 = 100_000;
const MATE_WINDOW: i32 = 1000;

/// True for scores that encode a forced mate
#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() > IMMEDIATE_MATE_SCORE - MATE_WINDOW
}

/// Plies until mate for a mate score
#[inline]
pub fn ply_to_mate(score: i32) -> i32 {
    IMMEDIATE_MATE_SCORE - score.abs()
}

/// What a stored value says about the true score
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Failed high, true score is at least the value
    LowerBound,
    /// Failed low, true score is at most the value
    UpperBound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub value: i32,
    pub depth: u32,
    pub bound: Bound,
    pub mv: Move,
}

#[derive(Clone, Debug)]
pub struct TranspositionTable {
    entries: Vec<Option<Entry>>,
}

impl TranspositionTable {
    pub fn new(capacity: usize) -> Self {
        TranspositionTable {
            entries: vec![None; capacity.max(1)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
    }

    #[inline]
    pub fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// The entry for `key`, if its slot holds that position
    pub fn entry(&self, key: u64) -> Option<&Entry> {
        self.entries[self.index(key)].as_ref().filter(|e| e.key == key)
    }

    /// Stored value for the position, provided it was searched at least
    /// `depth` deep and its bound settles the `[alpha, beta]` window.
    pub fn lookup(
        &self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        alpha: i32,
        beta: i32,
    ) -> Option<i32> {
        let entry = self.entry(key)?;
        if entry.depth < depth {
            return None;
        }

        let value = correct_retrieved_mate_score(entry.value, ply_from_root);
        match entry.bound {
            Bound::Exact => Some(value),
            Bound::LowerBound if value >= beta => Some(value),
            Bound::UpperBound if value <= alpha => Some(value),
            _ => None,
        }
    }

    /// Overwrite the slot for `key`, whatever it held
    pub fn store(
        &mut self,
        key: u64,
        depth: u32,
        ply_from_root: u32,
        value: i32,
        bound: Bound,
        mv: Move,
    ) {
        let index = self.index(key);
        self.entries[index] = Some(Entry {
            key,
            value: correct_mate_score_for_storage(value, ply_from_root),
            depth,
            bound,
            mv,
        });
    }

    /// Best move recorded for the position, or `Move::NULL`
    pub fn stored_move(&self, key: u64) -> Move {
        self.entry(key).map_or(Move::NULL, |e| e.mv)
    }

    /// Fill rate in permille over the first thousand slots
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        used * 1000 / sample
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        TranspositionTable::new(DEFAULT_ENTRIES)
    }
}

// Stored mate scores count plies from the storing node, not the root
fn correct_mate_score_for_storage(score: i32, ply_from_root: u32) -> i32 {
    if is_mate_score(score) {
        let sign = score.signum();
        (score * sign + ply_from_root as i32) * sign
    } else {
        score
    }
}

fn correct_retrieved_mate_score(score: i32, ply_from_root: u32) -> i32 {
    if is_mate_score(score) {
        let sign = score.signum();
        (score * sign - ply_from_root as i32) * sign
    } else {
        score
    }
}
