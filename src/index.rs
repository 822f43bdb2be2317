//! The perfect bijective hash from partial puzzle configurations to
//! dense integers, used as pattern database addresses.
//!
//! For a tileset of size `k`, a partial configuration is determined
//! by which `k` grid positions its tiles occupy and by the
//! arrangement of the tiles on those positions. The two parts are
//! ranked separately: the position set through the combinatorial
//! number system (with the precomputed unrank table for the inverse)
//! and the arrangement through its Lehmer code, counting for each
//! tile the higher-numbered pattern tiles placed before it. The
//! combined index multiplies them out against the mixed radix
//! `C(25, k) * k!`.
//!
//! If the tileset contains tile 0, the empty square's position is one
//! of the ranked positions (a zero-aware index); otherwise the empty
//! square is invisible to the index.

use crate::puzzle::puzzle::{Puzzle, TILE_COUNT};
use crate::tileset::{binomial, Tileset};

/// A combined pattern database index.
pub type CmbIndex = u64;

/// The largest tileset size for which the combined index fits in 64
/// bits.
pub const MAX_PATTERN_TILES: usize = 15;

/// A pattern database index split into its components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StructuredIndex {
    /// Rank of the set of grid positions holding pattern tiles.
    pub maprank: u32,
    /// Lehmer rank of the tiles' arrangement on those positions.
    /// Exceeds 32 bits once the tileset grows past twelve tiles.
    pub perm: u64,
}

const FACTORIALS: [u64; MAX_PATTERN_TILES + 1] = {
    let mut f = [1u64; MAX_PATTERN_TILES + 1];
    let mut i = 1;
    while i <= MAX_PATTERN_TILES {
        f[i] = f[i - 1] * i as u64;
        i += 1;
    }
    f
};

/// The number of partial puzzle configurations for `ts`, which is
/// `C(25, k) * k!` for a tileset of `k` tiles.
#[must_use]
pub fn search_space_size(ts: Tileset) -> CmbIndex {
    let k = ts.len();
    assert!(k <= MAX_PATTERN_TILES, "tileset too large to index");
    binomial(TILE_COUNT, k) * FACTORIALS[k]
}

/// Computes the structured index of `p` under `ts`.
#[must_use]
pub fn compute_index(ts: Tileset, p: &Puzzle) -> StructuredIndex {
    let k = ts.len();
    assert!(k <= MAX_PATTERN_TILES, "tileset too large to index");

    let mut occupied = 0u32;
    for t in ts.iter() {
        occupied |= 1 << p.position_of(t);
    }
    let maprank = Tileset::from_bits(occupied).rank();

    // Lehmer code of the arrangement: process the tiles in ascending
    // order and count, for each, the occupied positions below its own
    // that still belong to a higher-numbered tile.
    let mut perm = 0u64;
    let mut seen = 0u32;
    for (i, t) in ts.iter().enumerate() {
        let pos = p.position_of(t);
        let r = (occupied & ((1 << pos) - 1)).count_ones();
        let c = r - (seen & ((1 << r) - 1)).count_ones();
        seen |= 1 << r;
        perm = perm * (k - i) as u64 + u64::from(c);
    }

    StructuredIndex { maprank, perm }
}

/// Combines a structured index into a single integer.
#[must_use]
pub fn combine_index(ts: Tileset, idx: StructuredIndex) -> CmbIndex {
    let k = ts.len();
    u64::from(idx.maprank) * FACTORIALS[k] + idx.perm
}

/// Splits a combined index back into its components.
#[must_use]
pub fn split_index(ts: Tileset, cmb: CmbIndex) -> StructuredIndex {
    let k = ts.len();
    StructuredIndex {
        maprank: (cmb / FACTORIALS[k]) as u32,
        perm: cmb % FACTORIALS[k],
    }
}

/// Computes the combined index of `p` under `ts` in one step.
#[must_use]
pub fn full_index(ts: Tileset, p: &Puzzle) -> CmbIndex {
    combine_index(ts, compute_index(ts, p))
}

/// Reconstructs a puzzle from a structured index. The tiles outside
/// `ts` are filled into the free positions in ascending order, so the
/// result is one canonical member of the set of configurations
/// sharing the index.
#[must_use]
pub fn invert_index(ts: Tileset, idx: StructuredIndex) -> Puzzle {
    let k = ts.len();
    let cells = Tileset::unrank(k, idx.maprank);

    // Decode the Lehmer digits, least significant radix first.
    let mut digits = [0u32; MAX_PATTERN_TILES];
    let mut perm = idx.perm;
    for i in (0..k).rev() {
        let radix = (k - i) as u64;
        digits[i] = (perm % radix) as u32;
        perm /= radix;
    }

    let mut grid = [u8::MAX; TILE_COUNT];
    let mut free_ranks = (1u32 << k) - 1;
    let cell_list: Vec<u8> = cells.iter().collect();
    for (i, t) in ts.iter().enumerate() {
        let r = nth_set_bit(free_ranks, digits[i]);
        free_ranks &= !(1 << r);
        grid[cell_list[r as usize] as usize] = t;
    }

    let mut rest = ts.complement().iter();
    for cell in &mut grid {
        if *cell == u8::MAX {
            *cell = rest.next().unwrap();
        }
    }

    Puzzle::from_grid_unchecked(grid)
}

/// The position of the `n`-th set bit of `mask` (counting from the
/// least significant bit, `n` starting at 0).
fn nth_set_bit(mask: u32, n: u32) -> u32 {
    let mut mask = mask;
    for _ in 0..n {
        mask &= mask - 1;
    }
    mask.trailing_zeros()
}
