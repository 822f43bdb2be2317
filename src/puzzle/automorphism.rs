//! The symmetries of the tray.
//!
//! Rotating or mirroring the 5x5 tray maps the puzzle graph onto
//! itself, so the tray has the eight automorphisms of the dihedral
//! group. Each is stored as a permutation of the grid positions
//! together with its inverse. Morphing a configuration through an
//! automorphism conjugates both of its arrays and then returns the
//! empty square to the image of its previous position, so that
//! distances under zero-aware pattern databases are preserved.

use crate::puzzle::puzzle::{TILE_COUNT, ZERO_TILE};
use crate::tileset::Tileset;

/// The number of ways the tray can be rotated and mirrored.
pub const AUTOMORPHISM_COUNT: usize = 8;

/// The identity automorphism.
pub const IDENTITY: usize = 0;

/// Transposition of the tray along the main diagonal.
pub const TRANSPOSE: usize = 4;

/// One tray symmetry: a permutation of the grid positions and its
/// inverse.
pub struct Automorphism {
    pub perm: [u8; TILE_COUNT],
    pub inverse: [u8; TILE_COUNT],
}

/// The eight tray symmetries. Index 0 is the identity, 1 to 3 are the
/// quarter rotations, 4 to 7 their compositions with the diagonal
/// transposition.
#[rustfmt::skip]
pub static AUTOMORPHISMS: [Automorphism; AUTOMORPHISM_COUNT] = [
    Automorphism {
        perm:    [ 0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24],
        inverse: [ 0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24],
    },
    Automorphism {
        perm:    [20, 15, 10,  5,  0, 21, 16, 11,  6,  1, 22, 17, 12,  7,  2, 23, 18, 13,  8,  3, 24, 19, 14,  9,  4],
        inverse: [ 4,  9, 14, 19, 24,  3,  8, 13, 18, 23,  2,  7, 12, 17, 22,  1,  6, 11, 16, 21,  0,  5, 10, 15, 20],
    },
    Automorphism {
        perm:    [24, 23, 22, 21, 20, 19, 18, 17, 16, 15, 14, 13, 12, 11, 10,  9,  8,  7,  6,  5,  4,  3,  2,  1,  0],
        inverse: [24, 23, 22, 21, 20, 19, 18, 17, 16, 15, 14, 13, 12, 11, 10,  9,  8,  7,  6,  5,  4,  3,  2,  1,  0],
    },
    Automorphism {
        perm:    [ 4,  9, 14, 19, 24,  3,  8, 13, 18, 23,  2,  7, 12, 17, 22,  1,  6, 11, 16, 21,  0,  5, 10, 15, 20],
        inverse: [20, 15, 10,  5,  0, 21, 16, 11,  6,  1, 22, 17, 12,  7,  2, 23, 18, 13,  8,  3, 24, 19, 14,  9,  4],
    },
    Automorphism {
        perm:    [ 0,  5, 10, 15, 20,  1,  6, 11, 16, 21,  2,  7, 12, 17, 22,  3,  8, 13, 18, 23,  4,  9, 14, 19, 24],
        inverse: [ 0,  5, 10, 15, 20,  1,  6, 11, 16, 21,  2,  7, 12, 17, 22,  3,  8, 13, 18, 23,  4,  9, 14, 19, 24],
    },
    Automorphism {
        perm:    [20, 21, 22, 23, 24, 15, 16, 17, 18, 19, 10, 11, 12, 13, 14,  5,  6,  7,  8,  9,  0,  1,  2,  3,  4],
        inverse: [20, 21, 22, 23, 24, 15, 16, 17, 18, 19, 10, 11, 12, 13, 14,  5,  6,  7,  8,  9,  0,  1,  2,  3,  4],
    },
    Automorphism {
        perm:    [24, 19, 14,  9,  4, 23, 18, 13,  8,  3, 22, 17, 12,  7,  2, 21, 16, 11,  6,  1, 20, 15, 10,  5,  0],
        inverse: [24, 19, 14,  9,  4, 23, 18, 13,  8,  3, 22, 17, 12,  7,  2, 21, 16, 11,  6,  1, 20, 15, 10,  5,  0],
    },
    Automorphism {
        perm:    [ 4,  3,  2,  1,  0,  9,  8,  7,  6,  5, 14, 13, 12, 11, 10, 19, 18, 17, 16, 15, 24, 23, 22, 21, 20],
        inverse: [ 4,  3,  2,  1,  0,  9,  8,  7,  6,  5, 14, 13, 12, 11, 10, 19, 18, 17, 16, 15, 24, 23, 22, 21, 20],
    },
];

/// The group product: `GROUP_TABLE[a][b]` is the automorphism whose
/// permutation is `perm_a` composed with `perm_b` (`b` applied to the
/// argument first).
static GROUP_TABLE: [[u8; 8]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7],
    [1, 2, 3, 0, 5, 6, 7, 4],
    [2, 3, 0, 1, 6, 7, 4, 5],
    [3, 0, 1, 2, 7, 4, 5, 6],
    [4, 7, 6, 5, 0, 3, 2, 1],
    [5, 4, 7, 6, 1, 0, 3, 2],
    [6, 5, 4, 7, 2, 1, 0, 3],
    [7, 6, 5, 4, 3, 2, 1, 0],
];

/// Returns the group product of `a` and `b` as the function
/// composition `a ∘ b`: the resulting morphism applies first `b`,
/// then `a`.
#[must_use]
pub fn compose_morphisms(a: usize, b: usize) -> usize {
    GROUP_TABLE[a][b] as usize
}

/// Inverts an automorphism. All automorphisms are self-inverse except
/// for 1 and 3, which are inverse to each other.
#[inline]
#[must_use]
pub fn inverse_morphism(a: usize) -> usize {
    if a | 2 == 3 {
        a ^ 2
    } else {
        a
    }
}

/// Sends tileset `ts` through automorphism `a` and returns the
/// resulting tileset.
#[must_use]
pub fn tileset_morph(ts: Tileset, a: usize) -> Tileset {
    let mut out = Tileset::EMPTY;
    for t in ts.iter() {
        out = out.add(AUTOMORPHISMS[a].perm[t as usize]);
    }
    out
}

/// Returns true if `ts` morphed by `a` yields the same distances as
/// `ts`: the region the empty square occupies in the solved
/// configuration must be preserved by the morphism.
#[must_use]
pub fn is_admissible_morphism(ts: Tileset, a: usize) -> bool {
    let has_zero_tile = ts.contains(ZERO_TILE);
    let ts = ts.remove(ZERO_TILE);

    let mut region = ts.complement();
    if has_zero_tile {
        region = region.flood(ZERO_TILE as usize);
    }

    tileset_morph(region, a).contains(ZERO_TILE)
}

/// Given a tileset `ts`, finds the automorphism leading to the
/// lexicographically least tileset whose pattern database computes
/// the same distances as this one. Works for both zero-aware and
/// zero-unaware pattern databases.
#[must_use]
pub fn canonical_automorphism(ts: Tileset) -> usize {
    let tsnz = ts.remove(ZERO_TILE);
    let mut min_ts = tsnz;
    let mut min = IDENTITY;

    // The identity needs no check.
    for a in 1..AUTOMORPHISM_COUNT {
        let morphed = tileset_morph(tsnz, a);
        if morphed >= min_ts || !is_admissible_morphism(ts, a) {
            continue;
        }

        min_ts = morphed;
        min = a;
    }

    min
}
