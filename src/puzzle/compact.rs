//! A packed puzzle representation for breadth-first sweeps of the
//! full puzzle graph.
//!
//! Each configuration is stored in 124 bits: the positions of tiles 1
//! to 24 at five bits apiece (the empty square's position is the one
//! position left over) plus four bits marking the moves that lead
//! back into the previous generation. `lo` holds twelve tile
//! positions above the four mask bits, `hi` the remaining twelve.
//! The mask bits correspond to the directions in N, E, S, W order.

use crate::puzzle::direction::Direction;
use crate::puzzle::puzzle::{moves, Puzzle, TILE_COUNT};

/// The four move-mask bits in the low end of `lo`.
pub const MOVE_MASK: u64 = 0xf;

/// A packed puzzle configuration with its move mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactPuzzle {
    lo: u64,
    hi: u64,
}

impl CompactPuzzle {
    /// The moves that would re-enter the previous generation, one bit
    /// per direction.
    #[inline]
    #[must_use]
    pub fn move_mask(self) -> u64 {
        self.lo & MOVE_MASK
    }

    /// The packed configuration with the mask bits cleared, used as
    /// the key that identifies a configuration regardless of how it
    /// was reached.
    #[inline]
    #[must_use]
    pub fn key(self) -> (u64, u64) {
        (self.hi, self.lo & !MOVE_MASK)
    }

    /// Unpacks into the two-array representation.
    #[must_use]
    pub fn unpack(self) -> Puzzle {
        let mut grid = [0u8; TILE_COUNT];
        let mut occupied = 0u32;
        for t in 1..TILE_COUNT {
            let pos = if t <= 12 {
                (self.lo >> (4 + 5 * (t - 1))) & 0x1f
            } else {
                (self.hi >> (5 * (t - 13))) & 0x1f
            };
            grid[pos as usize] = t as u8;
            occupied |= 1 << pos;
        }
        let zloc = (!occupied & ((1 << TILE_COUNT) - 1)).trailing_zeros() as usize;
        grid[zloc] = 0;
        Puzzle::from_grid_unchecked(grid)
    }
}

/// Packs `p` together with a move mask.
#[must_use]
pub fn pack(p: &Puzzle, mask: u64) -> CompactPuzzle {
    debug_assert_eq!(mask & !MOVE_MASK, 0);
    let mut lo = mask;
    let mut hi = 0;
    for t in 1..TILE_COUNT {
        let pos = p.position_of(t as u8) as u64;
        if t <= 12 {
            lo |= pos << (4 + 5 * (t - 1));
        } else {
            hi |= pos << (5 * (t - 13));
        }
    }
    CompactPuzzle { lo, hi }
}

/// Expands generation `cur` into `next`: every configuration is
/// advanced by each move its mask does not forbid, the results are
/// sorted on the configuration key, and duplicates are merged by
/// OR-ing their masks so every move back into `cur` stays forbidden.
pub fn round(next: &mut Vec<CompactPuzzle>, cur: &[CompactPuzzle]) {
    next.clear();

    for &cp in cur {
        let mut p = cp.unpack();
        let mask = cp.move_mask();
        let zloc = p.zero_location();
        for &m in moves(zloc) {
            if m < 0 {
                continue;
            }
            let dir = Direction::between(zloc, m as usize);
            if mask & 1 << dir as usize != 0 {
                continue;
            }
            p.slide(m as usize);
            next.push(pack(&p, 1 << dir.inverse() as usize));
            p.slide(zloc);
        }
    }

    next.sort_unstable_by_key(|cp| cp.key());
    let mut kept = 0;
    for i in 0..next.len() {
        if kept > 0 && next[i].key() == next[kept - 1].key() {
            let mask = next[i].lo & MOVE_MASK;
            next[kept - 1].lo |= mask;
        } else {
            next[kept] = next[i];
            kept += 1;
        }
    }
    next.truncate(kept);
}
