//! Defines the [`PatternDb`] type: a flat table holding, for every
//! partial puzzle configuration of one tileset, the number of pattern
//! tile moves needed to bring the pattern tiles home.
//!
//! A table is either generated in memory or memory-mapped read-only
//! from the headerless on-disk format: `search_space_size` raw bytes,
//! byte `i` being the distance of configuration `i` or [`UNREACHED`].

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use memmap2::Mmap;
use thiserror::Error;

use crate::index::{full_index, invert_index, search_space_size, split_index, CmbIndex};
use crate::puzzle::puzzle::{moves, Puzzle, ZERO_TILE};
use crate::tileset::Tileset;

/// Sentinel for an entry no breadth-first round has reached. In a
/// reduced table it marks an entry whose distance is recovered from a
/// neighbour at lookup time.
pub const UNREACHED: u8 = 0xff;

/// Length of a distance histogram.
pub const HISTOGRAM_LEN: usize = 256;

enum Storage {
    Heap(Box<[u8]>),
    Mapped(Mmap),
}

/// A pattern database for one tileset.
pub struct PatternDb {
    ts: Tileset,
    data: Storage,
}

/// Error type for pattern database construction and reduction.
#[derive(Debug, Error)]
pub enum PdbError {
    #[error("Io: {0}")]
    Io(#[from] io::Error),

    /// The byte source does not match the tileset's search space.
    #[error("SizeMismatch: tileset {ts} needs {expected} bytes, found {found}")]
    SizeMismatch {
        ts: Tileset,
        expected: u64,
        found: u64,
    },

    /// The dominating-set reducer only handles zero-unaware tables.
    #[error("ZeroAware: tileset {0} tracks the empty square; reduction is not defined for it")]
    ZeroAware(Tileset),
}

impl PatternDb {
    pub(crate) fn from_heap(ts: Tileset, data: Box<[u8]>) -> Self {
        debug_assert_eq!(data.len() as u64, search_space_size(ts));
        Self {
            ts,
            data: Storage::Heap(data),
        }
    }

    /// Wraps a byte vector read from elsewhere, checking its length.
    pub fn from_bytes(ts: Tileset, data: Box<[u8]>) -> Result<Self, PdbError> {
        let expected = search_space_size(ts);
        if data.len() as u64 != expected {
            return Err(PdbError::SizeMismatch {
                ts,
                expected,
                found: data.len() as u64,
            });
        }
        Ok(Self::from_heap(ts, data))
    }

    /// Memory-maps a pattern database file. The mapping stays alive
    /// for the lifetime of the value.
    pub fn map_file(ts: Tileset, path: &Path) -> Result<Self, PdbError> {
        let file = File::open(path)?;
        // SAFETY: the mapping is private and read-only; the file is a
        // data file under the catalogue's control, not expected to be
        // truncated while mapped.
        let map = unsafe { Mmap::map(&file)? };
        let expected = search_space_size(ts);
        if map.len() as u64 != expected {
            return Err(PdbError::SizeMismatch {
                ts,
                expected,
                found: map.len() as u64,
            });
        }
        Ok(Self {
            ts,
            data: Storage::Mapped(map),
        })
    }

    /// Writes the raw byte table.
    pub fn save<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.bytes())
    }

    /// The tileset this table is indexed by.
    #[must_use]
    pub fn tileset(&self) -> Tileset {
        self.ts
    }

    /// The raw distance bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            Storage::Heap(b) => b,
            Storage::Mapped(m) => m,
        }
    }

    /// Mutable access to the distance bytes, copying a mapped table
    /// onto the heap first.
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        if matches!(self.data, Storage::Mapped(_)) {
            let copied: Box<[u8]> = self.bytes().into();
            self.data = Storage::Heap(copied);
        }
        match &mut self.data {
            Storage::Heap(b) => b,
            Storage::Mapped(_) => unreachable!(),
        }
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes().len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// The distance byte of a combined index.
    #[inline]
    #[must_use]
    pub fn lookup(&self, idx: CmbIndex) -> u8 {
        self.bytes()[idx as usize]
    }

    /// The heuristic contribution of configuration `p`. On a reduced
    /// table an [`UNREACHED`] entry resolves to one more than the
    /// least finite neighbour, which the reducer guarantees to be the
    /// exact original distance.
    #[must_use]
    pub fn hval(&self, p: &Puzzle) -> u32 {
        let d = self.lookup(full_index(self.ts, p));
        if d != UNREACHED {
            return u32::from(d);
        }

        let mut best = u32::MAX;
        let mut q = p.clone();
        for_each_neighbor(self.ts, &mut q, &mut |n: &mut Puzzle| {
            let nd = self.lookup(full_index(self.ts, n));
            if nd != UNREACHED {
                best = best.min(u32::from(nd) + 1);
            }
        });
        assert!(best != u32::MAX, "entry has no finite neighbour");
        best
    }

    /// Counts how often each byte value occurs.
    #[must_use]
    pub fn histogram(&self) -> [u64; HISTOGRAM_LEN] {
        let mut histogram = [0u64; HISTOGRAM_LEN];
        for &b in self.bytes() {
            histogram[b as usize] += 1;
        }
        histogram
    }

    /// The number of equidistance classes: the length of the leading
    /// run of populated distances.
    #[must_use]
    pub fn classes(&self) -> usize {
        let histogram = self.histogram();
        histogram.iter().take_while(|&&n| n != 0).count()
    }

    /// Reconstructs the canonical configuration of entry `idx`.
    #[must_use]
    pub fn config(&self, idx: CmbIndex) -> Puzzle {
        invert_index(self.ts, split_index(self.ts, idx))
    }
}

/// Calls `f` for every configuration directly reachable from `p`'s
/// equivalence class by one pattern tile move.
///
/// For a zero-aware tileset the empty square visits each boundary
/// position of its region and pushes every adjacent pattern tile; for
/// a zero-unaware tileset each pattern tile steps onto each adjacent
/// position not held by another pattern tile. `f` may inspect and
/// temporarily modify the configuration but must restore it before
/// returning; `p` itself is restored before this function returns.
pub(crate) fn for_each_neighbor<F>(ts: Tileset, p: &mut Puzzle, f: &mut F)
where
    F: FnMut(&mut Puzzle),
{
    if ts.contains(ZERO_TILE) {
        let zloc = p.zero_location();
        let eq = ts.eqclass(p);
        for boundary in eq.reduce_eqclass().iter() {
            let boundary = boundary as usize;
            p.slide(boundary);
            for &m in moves(boundary) {
                if m < 0 || eq.contains(m as u8) {
                    continue;
                }
                p.slide(m as usize);
                f(p);
                p.slide(boundary);
            }
        }
        p.slide(zloc);
    } else {
        for t in ts.iter() {
            let from = p.position_of(t);
            for &m in moves(from) {
                if m < 0 || ts.contains(p.tile_at(m as usize)) {
                    continue;
                }
                p.swap_positions(from, m as usize);
                f(p);
                p.swap_positions(from, m as usize);
            }
        }
    }
}

/// Calls `f` for every member of `p`'s equivalence class. For a
/// zero-unaware tileset the class is the configuration itself.
pub(crate) fn for_each_class_member<F>(ts: Tileset, p: &mut Puzzle, f: &mut F)
where
    F: FnMut(&mut Puzzle),
{
    if ts.contains(ZERO_TILE) {
        let zloc = p.zero_location();
        for c in ts.eqclass(p).iter() {
            p.slide(c as usize);
            f(p);
        }
        p.slide(zloc);
    } else {
        f(p);
    }
}

#[cfg(test)]
mod tests {
    use super::{for_each_neighbor, PatternDb, PdbError};
    use crate::index::search_space_size;
    use crate::puzzle::puzzle::Puzzle;
    use crate::tileset::Tileset;

    #[test]
    fn test_from_bytes_checks_size() {
        let ts: Tileset = "1,2".parse().unwrap();
        let n = search_space_size(ts) as usize;
        assert!(PatternDb::from_bytes(ts, vec![0; n].into_boxed_slice()).is_ok());
        assert!(matches!(
            PatternDb::from_bytes(ts, vec![0; n - 1].into_boxed_slice()),
            Err(PdbError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_neighbors_restore_configuration() {
        for s in ["1,2", "0,1,2"] {
            let ts: Tileset = s.parse().unwrap();
            let mut p = Puzzle::solved();
            let before = p.clone();
            let mut count = 0;
            for_each_neighbor(ts, &mut p, &mut |q: &mut Puzzle| {
                assert!(*q != before);
                count += 1;
            });
            assert_eq!(p, before, "tileset {s}");
            assert!(count > 0);
        }
    }

    #[test]
    fn test_zero_unaware_neighbor_count() {
        // Tile 7 sits in the interior with no other pattern tiles
        // around, so it has exactly four neighbours.
        let ts: Tileset = "7".parse().unwrap();
        let mut p = Puzzle::solved();
        let mut count = 0;
        for_each_neighbor(ts, &mut p, &mut |_: &mut Puzzle| count += 1);
        assert_eq!(count, 4);
    }
}
