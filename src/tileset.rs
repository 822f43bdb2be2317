//! Defines the [`Tileset`] type: a subset of the 25 tile labels,
//! stored as a 25-bit mask.
//!
//! The same representation doubles as a set of grid positions, which
//! is how the flood fill and the equivalence-class helpers use it.
//! Combination ranking and unranking map the `C(25, k)` subsets of a
//! fixed size onto a dense integer range; the unrank direction uses
//! lazily built lookup tables.

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::OnceLock;

use itertools::Itertools as _;
use thiserror::Error;

use crate::puzzle::puzzle::{Puzzle, TILE_COUNT, TRAY_WIDTH, ZERO_TILE};

/// A subset of the tile labels 0 to 24 (or of the grid positions,
/// which carry the same numbers).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tileset(u32);

/// Error type for [`Tileset::from_str`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TilesetError {
    /// The string contained no tiles.
    #[error("Empty: tileset string is empty")]
    Empty,

    /// A field was not a number in `0..25`.
    #[error("TileOutOfRange: tile {0} is out of range")]
    TileOutOfRange(String),

    /// A tile occurred more than once.
    #[error("DuplicateTile: tile {0} appears more than once")]
    DuplicateTile(u8),
}

const MASK: u32 = (1 << TILE_COUNT) - 1;

/// Masks of the leftmost and rightmost tray columns, used to keep
/// horizontal shifts from wrapping across rows.
const COL_WEST: u32 = 0x0108421;
const COL_EAST: u32 = 0x1084210;

impl Tileset {
    /// The empty tileset.
    pub const EMPTY: Self = Self(0);

    /// The tileset holding every tile.
    pub const FULL: Self = Self(MASK);

    /// The raw 25-bit mask.
    #[inline]
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub(crate) fn from_bits(bits: u32) -> Self {
        Self(bits & MASK)
    }

    /// Whether `tile` is a member.
    #[inline]
    #[must_use]
    pub fn contains(self, tile: u8) -> bool {
        self.0 & 1 << tile != 0
    }

    /// The set with `tile` added.
    #[inline]
    #[must_use]
    pub fn add(self, tile: u8) -> Self {
        Self(self.0 | 1 << tile)
    }

    /// The set with `tile` removed.
    #[inline]
    #[must_use]
    pub fn remove(self, tile: u8) -> Self {
        Self(self.0 & !(1 << tile))
    }

    /// The least member. Must not be called on the empty set.
    #[inline]
    #[must_use]
    pub fn least(self) -> u8 {
        debug_assert!(!self.is_empty());
        self.0.trailing_zeros() as u8
    }

    /// The set with its least member removed.
    #[inline]
    #[must_use]
    pub fn remove_least(self) -> Self {
        Self(self.0 & (self.0 - 1))
    }

    /// The complement with respect to the full tile alphabet.
    #[inline]
    #[must_use]
    pub fn complement(self) -> Self {
        Self(!self.0 & MASK)
    }

    /// The number of members.
    #[inline]
    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the members in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        let mut rest = self;
        std::iter::from_fn(move || {
            if rest.is_empty() {
                None
            } else {
                let t = rest.least();
                rest = rest.remove_least();
                Some(t)
            }
        })
    }

    /// The set of all positions 4-adjacent to a member, members
    /// included.
    #[inline]
    fn grow(self) -> Self {
        let t = self.0;
        let n = t >> TRAY_WIDTH;
        let s = t << TRAY_WIDTH;
        let e = (t & !COL_EAST) << 1;
        let w = (t & !COL_WEST) >> 1;
        Self((t | n | s | e | w) & MASK)
    }

    /// The connected component of position `z` within `self` under
    /// the tray's 4-adjacency. `z` itself is always part of the
    /// result.
    #[must_use]
    pub fn flood(self, z: usize) -> Self {
        let mut region = Self(1 << z);
        loop {
            let grown = Self(region.grow().0 & (self.0 | region.0));
            if grown == region {
                return region;
            }
            region = grown;
        }
    }

    /// The equivalence-class region of `p` with respect to this
    /// tileset: the positions the empty square can reach without
    /// disturbing a pattern tile. All configurations that differ only
    /// in the empty square's position within this region share one
    /// pattern database entry.
    #[must_use]
    pub fn eqclass(self, p: &Puzzle) -> Self {
        let mut occupied = 0u32;
        for t in self.remove(ZERO_TILE).iter() {
            occupied |= 1 << p.position_of(t);
        }
        Self(!occupied & MASK).flood(p.zero_location())
    }

    /// The subset of an equivalence-class region from which a move
    /// can leave the class: the region's boundary positions, each
    /// adjacent to at least one pattern tile. Enumerating moves from
    /// these positions visits every class-leaving move exactly once.
    #[must_use]
    pub fn reduce_eqclass(self) -> Self {
        Self(self.0 & self.complement().grow().0)
    }

    /// Whether `p` is the canonical representative of its equivalence
    /// class `eq`: the member with the empty square on the least
    /// position of the region.
    #[must_use]
    pub fn is_canonical(eq: Self, p: &Puzzle) -> bool {
        p.zero_location() == eq.least() as usize
    }

    /// The rank of this set among all sets of the same size, ordered
    /// by their mask value (the combinatorial number system).
    #[must_use]
    pub fn rank(self) -> u32 {
        let mut rank = 0u64;
        for (i, t) in self.iter().enumerate() {
            rank += binomial(t as usize, i + 1);
        }
        rank as u32
    }

    /// The inverse of [`Tileset::rank`] for sets of `k` members.
    #[must_use]
    pub fn unrank(k: usize, rank: u32) -> Self {
        Self(unrank_table(k)[rank as usize])
    }
}

/// `C(n, k)` for `n, k <= 25`.
#[must_use]
pub fn binomial(n: usize, k: usize) -> u64 {
    static TABLE: OnceLock<[[u64; TILE_COUNT + 1]; TILE_COUNT + 1]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut c = [[0u64; TILE_COUNT + 1]; TILE_COUNT + 1];
        for n in 0..=TILE_COUNT {
            c[n][0] = 1;
            for k in 1..=n {
                c[n][k] = c[n - 1][k - 1] + c[n - 1][k];
            }
        }
        c
    });
    if k > n {
        0
    } else {
        table[n][k]
    }
}

/// Computes the lexicographically next mask with as many bits set as
/// `ts`.
fn next_combination(ts: u32) -> u32 {
    // https://graphics.stanford.edu/~seander/bithacks.html
    let t = ts | (ts - 1);
    (t + 1) | (((!t & t.wrapping_neg()) - 1) >> (ts.trailing_zeros() + 1))
}

/// The table of all `C(25, k)` masks with `k` bits in ascending
/// order, built on first use.
fn unrank_table(k: usize) -> &'static [u32] {
    const LOCK: OnceLock<Box<[u32]>> = OnceLock::new();
    static TABLES: [OnceLock<Box<[u32]>>; TILE_COUNT + 1] = [LOCK; TILE_COUNT + 1];

    TABLES[k].get_or_init(|| {
        let n = binomial(TILE_COUNT, k) as usize;
        let mut table = Vec::with_capacity(n);
        if k == 0 {
            table.push(0);
        } else {
            let mut iter = (1u32 << k) - 1;
            for _ in 0..n {
                table.push(iter);
                iter = next_combination(iter);
            }
        }
        table.into_boxed_slice()
    })
}

impl Display for Tileset {
    /// Formats the members as comma-separated ascending tile numbers,
    /// the form the catalogue manifest and the pattern database file
    /// names use.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().format(","))
    }
}

impl FromStr for Tileset {
    type Err = TilesetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ts = Self::EMPTY;
        for field in s.split(',') {
            let field = field.trim();
            if field.is_empty() {
                return Err(TilesetError::Empty);
            }
            let t = field
                .parse::<u8>()
                .ok()
                .filter(|&t| (t as usize) < TILE_COUNT)
                .ok_or_else(|| TilesetError::TileOutOfRange(field.to_string()))?;
            if ts.contains(t) {
                return Err(TilesetError::DuplicateTile(t));
            }
            ts = ts.add(t);
        }
        Ok(ts)
    }
}
