//! Gambit - Bitboard Module
//!
//! Precomputed move data shared by the move generator, the evaluator and the
//! move orderer. A bitboard is a 64-bit integer where each bit represents a
//! square on the board (bit 0 = a1).

// ============================================================================
// CONSTANTS - Directions
// ============================================================================

/// Square offsets for the eight ray directions.
/// Indices 0..4 are orthogonal (N, S, W, E), 4..8 diagonal (NW, SE, NE, SW).
pub const DIRECTION_OFFSETS: [i32; 8] = [8, -8, -1, 1, 7, -7, 9, -9];

pub const ORTHOGONAL_DIRECTIONS: std::ops::Range<usize> = 0..4;
pub const DIAGONAL_DIRECTIONS: std::ops::Range<usize> = 4..8;
pub const ALL_DIRECTIONS: std::ops::Range<usize> = 0..8;

// ============================================================================
// PRECOMPUTED TABLES
// ============================================================================

/// Number of squares from each square to the board edge, per direction
pub static NUM_SQUARES_TO_EDGE: [[usize; 8]; 64] = init_squares_to_edge();

/// (file, rank) steps of each leaper
const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_STEPS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];
const WHITE_PAWN_CAPTURES: [(i32, i32); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_CAPTURES: [(i32, i32); 2] = [(-1, -1), (1, -1)];

pub static KNIGHT_ATTACKS: [u64; 64] = leaper_table(&KNIGHT_JUMPS);
pub static KING_ATTACKS: [u64; 64] = leaper_table(&KING_STEPS);

/// Squares a pawn on each square attacks, indexed by colour (0 = white)
pub static PAWN_ATTACKS: [[u64; 64]; 2] = [
    leaper_table(&WHITE_PAWN_CAPTURES),
    leaper_table(&BLACK_PAWN_CAPTURES),
];

/// Manhattan distance of each square from the four centre squares
pub static CENTRE_MANHATTAN_DISTANCE: [i32; 64] = init_centre_distance();

const fn min(a: usize, b: usize) -> usize {
    if a < b {
        a
    } else {
        b
    }
}

const fn init_squares_to_edge() -> [[usize; 8]; 64] {
    let mut table = [[0usize; 8]; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = sq % 8;
        let rank = sq / 8;
        let north = 7 - rank;
        let south = rank;
        let west = file;
        let east = 7 - file;

        table[sq] = [
            north,
            south,
            west,
            east,
            min(north, west),
            min(south, east),
            min(north, east),
            min(south, west),
        ];
        sq += 1;
    }

    table
}

/// Targets reachable from every square by one of `steps`, dropping any that
/// leave the board
const fn leaper_table(steps: &[(i32, i32)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut i = 0;
        while i < steps.len() {
            let (df, dr) = steps[i];
            let (f, r) = (file + df, rank + dr);
            if f >= 0 && f < 8 && r >= 0 && r < 8 {
                table[sq] |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        sq += 1;
    }

    table
}

const fn init_centre_distance() -> [i32; 64] {
    let mut table = [0i32; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let file_dist = if file < 4 { 3 - file } else { file - 4 };
        let rank_dist = if rank < 4 { 3 - rank } else { rank - 4 };
        table[sq] = file_dist + rank_dist;
        sq += 1;
    }

    table
}

// ============================================================================
// BITBOARD UTILITIES
// ============================================================================

/// Remove the lowest set square from `bb` and return it
#[inline]
pub fn pop_lsb(bb: &mut u64) -> usize {
    let sq = bb.trailing_zeros() as usize;
    *bb &= bb.wrapping_sub(1);
    sq
}

#[inline]
pub const fn square_bb(sq: usize) -> u64 {
    1 << sq
}

#[inline]
pub const fn contains(bb: u64, sq: usize) -> bool {
    bb & (1u64 << sq) != 0
}

/// Step from `sq` along direction index `dir` by `n` squares.
/// Caller guarantees `n <= NUM_SQUARES_TO_EDGE[sq][dir]`.
#[inline]
pub const fn step(sq: usize, dir: usize, n: usize) -> usize {
    (sq as i32 + DIRECTION_OFFSETS[dir] * n as i32) as usize
}

/// Orthogonal (rook) distance between two squares
#[inline]
pub fn orthogonal_distance(a: usize, b: usize) -> i32 {
    let file_dist = (a % 8).abs_diff(b % 8);
    let rank_dist = (a / 8).abs_diff(b / 8);
    (file_dist + rank_dist) as i32
}

/// True if `a`, `b` and `c` lie on one straight line.
/// Used with `a` as a king square and `b` on one of its rays.
#[inline]
pub fn aligned(a: usize, b: usize, c: usize) -> bool {
    let (af, ar) = ((a % 8) as i32, (a / 8) as i32);
    let (bf, br) = ((b % 8) as i32, (b / 8) as i32);
    let (cf, cr) = ((c % 8) as i32, (c / 8) as i32);
    (bf - af) * (cr - ar) == (br - ar) * (cf - af)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squares_to_edge() {
        // a1: nothing south or west
        assert_eq!(NUM_SQUARES_TO_EDGE[0], [7, 0, 0, 7, 0, 0, 7, 0]);
        // e4 (28)
        assert_eq!(NUM_SQUARES_TO_EDGE[28], [4, 3, 4, 3, 4, 3, 3, 3]);
    }

    #[test]
    fn test_leaper_tables() {
        assert_eq!(KNIGHT_ATTACKS[0].count_ones(), 2);
        assert_eq!(KNIGHT_ATTACKS[28].count_ones(), 8);
        assert_eq!(KING_ATTACKS[0].count_ones(), 3);
        assert_eq!(KING_ATTACKS[63].count_ones(), 3);
        assert_eq!(KING_ATTACKS[28].count_ones(), 8);
        // e2 white pawn hits d3 and f3
        assert_eq!(PAWN_ATTACKS[0][12], square_bb(19) | square_bb(21));
        // a7 black pawn only hits b6
        assert_eq!(PAWN_ATTACKS[1][48], square_bb(41));
    }

    #[test]
    fn test_distances() {
        assert_eq!(CENTRE_MANHATTAN_DISTANCE[0], 6);
        assert_eq!(CENTRE_MANHATTAN_DISTANCE[27], 0);
        assert_eq!(orthogonal_distance(0, 63), 14);
    }

    #[test]
    fn test_alignment() {
        // e1, e4, e8 share a file
        assert!(aligned(4, 28, 60));
        // e1, f2, h4 share a diagonal
        assert!(aligned(4, 13, 31));
        assert!(!aligned(4, 13, 14));
    }
}
