//! Gambit - Piece List Module
//!
//! Dense set of occupied squares for one piece type and colour, with a
//! square-to-slot map so that add, remove and relocate are all O(1).

/// Maximum pieces of a single type per side (eight pawns promoting, plus
/// the two originals for minor and major pieces)
pub const MAX_PIECES: usize = 16;

#[derive(Clone, Debug)]
pub struct PieceList {
    occupied: [usize; MAX_PIECES],
    map: [usize; 64],
    count: usize,
}

impl PieceList {
    pub fn new() -> Self {
        PieceList {
            occupied: [0; MAX_PIECES],
            map: [0; 64],
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn add(&mut self, sq: usize) {
        self.occupied[self.count] = sq;
        self.map[sq] = self.count;
        self.count += 1;
    }

    /// Remove by moving the last entry into the freed slot
    pub fn remove(&mut self, sq: usize) {
        let slot = self.map[sq];
        let last = self.occupied[self.count - 1];
        self.occupied[slot] = last;
        self.map[last] = slot;
        self.count -= 1;
    }

    pub fn move_piece(&mut self, from: usize, to: usize) {
        let slot = self.map[from];
        self.occupied[slot] = to;
        self.map[to] = slot;
    }

    #[inline]
    pub fn squares(&self) -> &[usize] {
        &self.occupied[..self.count]
    }

    pub fn contains(&self, sq: usize) -> bool {
        let slot = self.map[sq];
        slot < self.count && self.occupied[slot] == sq
    }
}

impl Default for PieceList {
    fn default() -> Self {
        PieceList::new()
    }
}
