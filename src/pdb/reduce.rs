//! Pattern database reduction through approximate minimal dominating
//! sets.
//!
//! The quotient of a pattern database by distance-to-solved is a
//! path: every configuration at distance `d` has a neighbour at
//! `d - 1`. Working from the farthest equidistance class inward, a
//! greedy pass keeps a subset of each class that dominates every
//! not-yet-covered configuration one class further out and erases the
//! rest. Erased entries become [`UNREACHED`]; a lookup resolves them
//! through a retained neighbour exactly one closer, so the heuristic
//! is unchanged while most of the table compresses to one value.
//!
//! The greedy choice uses a binary max-heap keyed by how many
//! outstanding configurations a candidate would newly cover. A popped
//! key can be stale when siblings already covered part of the
//! candidate's reach; the root is refreshed and sifted down until a
//! fresh maximum surfaces, only then is it committed.
//!
//! Reduction is defined for zero-unaware tilesets. A table that
//! already contains [`UNREACHED`] entries is already reduced and is
//! left untouched.

use log::info;

use crate::index::{full_index, CmbIndex};
use crate::pdb::pdb::{for_each_neighbor, PatternDb, PdbError, UNREACHED};
use crate::puzzle::puzzle::{Puzzle, ZERO_TILE};
use crate::tileset::Tileset;

/// Marks an entry whose cover is still outstanding during reduction.
const TO_BE_DOMINATED: u8 = 0xfe;

/// Key marking a vertex as settled (chosen into the dominating set or
/// already covered).
const DOMINATED: u32 = u32::MAX;

/// One entry of an equidistance array: a configuration index and the
/// number of outstanding configurations it would newly cover.
#[derive(Clone, Copy)]
struct Vertex {
    index: CmbIndex,
    additions: u32,
}

struct Heap<'a> {
    root: &'a mut [Vertex],
    length: usize,
}

impl Heap<'_> {
    fn less_than(&self, i: usize, j: usize) -> bool {
        self.root[i].additions < self.root[j].additions
    }

    /// Restores the heap property below `i`. Returns true if the
    /// entry did not move.
    fn heapify(&mut self, i: usize) -> bool {
        let mut parent = i;
        loop {
            let mut max = parent;
            let left = 2 * parent + 1;
            let right = 2 * parent + 2;

            if left < self.length && self.less_than(max, left) {
                max = left;
            }
            if right < self.length && self.less_than(max, right) {
                max = right;
            }
            if max == parent {
                return max == i;
            }

            self.root.swap(max, parent);
            parent = max;
        }
    }

    /// Floyd's heap construction.
    fn build(root: &mut [Vertex]) -> Heap<'_> {
        let length = root.len();
        let mut heap = Heap { root, length };
        for i in (0..heap.length / 2).rev() {
            heap.heapify(i);
        }
        heap
    }

    fn remove_root(&mut self) {
        self.length -= 1;
        self.root.swap(0, self.length);
        self.heapify(0);
    }
}

/// The largest possible neighbourhood of one configuration: each
/// pattern tile can step onto at most its four adjacent positions.
fn max_reach(ts: Tileset) -> usize {
    4 * ts.len()
}

/// Collects the indices of all `TO_BE_DOMINATED` entries adjacent to
/// the configuration at `cmb` into `reach`.
fn compute_reach(pdb: &PatternDb, reach: &mut Vec<CmbIndex>, cmb: CmbIndex) {
    let ts = pdb.tileset();
    reach.clear();
    let mut p = pdb.config(cmb);
    for_each_neighbor(ts, &mut p, &mut |q: &mut Puzzle| {
        let key = full_index(ts, q);
        if pdb.lookup(key) == TO_BE_DOMINATED {
            reach.push(key);
        }
    });
    assert!(reach.len() <= max_reach(ts));
}

/// Chooses a subset of the equidistance class `near` that dominates
/// all `n_dominatee` outstanding entries, erasing each covered entry
/// to [`UNREACHED`]. Chosen vertices are marked [`DOMINATED`].
fn find_dominating_set(
    pdb: &mut PatternDb,
    near: &mut [Vertex],
    mut n_dominatee: usize,
) {
    let mut reach = Vec::with_capacity(max_reach(pdb.tileset()));

    for v in &mut *near {
        compute_reach(pdb, &mut reach, v.index);
        v.additions = reach.len() as u32;
    }

    let mut heap = Heap::build(near);
    while n_dominatee > 0 && heap.length > 0 {
        let root_index = heap.root[0].index;
        compute_reach(pdb, &mut reach, root_index);

        // Earlier commits may have covered part of this vertex's
        // reach; refresh the stale key and sift. Commit only once the
        // root survives the refresh.
        if reach.len() as u32 != heap.root[0].additions {
            heap.root[0].additions = reach.len() as u32;
            if !heap.heapify(0) {
                continue;
            }
        }

        assert!(!reach.is_empty(), "chosen vertex covers nothing");
        for &key in &reach {
            pdb.bytes_mut()[key as usize] = UNREACHED;
        }
        n_dominatee -= reach.len();
        heap.root[0].additions = DOMINATED;
        heap.remove_root();
    }

    assert_eq!(n_dominatee, 0, "equidistance class failed to dominate");
}

/// Overwrites the entries of `near` not chosen into the dominating
/// set with `TO_BE_DOMINATED` and returns their number.
fn eradicate_entries(pdb: &mut PatternDb, near: &[Vertex]) -> usize {
    let mut eradicated = 0;
    for v in near {
        if v.additions != DOMINATED {
            pdb.bytes_mut()[v.index as usize] = TO_BE_DOMINATED;
            eradicated += 1;
        }
    }
    eradicated
}

/// Collects the indices of all entries at `distance` into a vertex
/// array.
fn accumulate_eqclass(pdb: &PatternDb, distance: u8, expected: u64) -> Vec<Vertex> {
    let mut class = Vec::with_capacity(expected as usize);
    for (i, &b) in pdb.bytes().iter().enumerate() {
        if b == distance {
            class.push(Vertex {
                index: i as CmbIndex,
                additions: 0,
            });
        }
    }
    debug_assert_eq!(class.len() as u64, expected);
    class
}

/// Reduces `pdb` in place. Entries erased to [`UNREACHED`] resolve
/// through a retained neighbour at lookup time, so every heuristic
/// value is preserved.
pub fn reduce_patterndb(pdb: &mut PatternDb) -> Result<(), PdbError> {
    let ts = pdb.tileset();
    if ts.contains(ZERO_TILE) {
        return Err(PdbError::ZeroAware(ts));
    }

    let histogram = pdb.histogram();
    if histogram[UNREACHED as usize] != 0 {
        info!("tileset {ts}: table already reduced");
        return Ok(());
    }
    let n_classes = pdb.classes();
    if n_classes < 2 {
        return Ok(());
    }
    info!("tileset {ts}: reducing {n_classes} equidistance classes");

    for b in pdb.bytes_mut() {
        if *b == (n_classes - 1) as u8 {
            *b = TO_BE_DOMINATED;
        }
    }
    let mut outstanding = histogram[n_classes - 1] as usize;

    for d in (1..n_classes).rev() {
        let n_near = histogram[d - 1];
        let mut near = accumulate_eqclass(pdb, (d - 1) as u8, n_near);
        find_dominating_set(pdb, &mut near, outstanding);

        let eradicated = eradicate_entries(pdb, &near);
        // On the last round everything must have been chosen; a
        // leftover would have no dominator.
        assert!(d > 1 || eradicated == 0, "undominated residue");
        outstanding = eradicated;

        info!(
            "tileset {ts}: distance {}: kept {} of {n_near}",
            d - 1,
            n_near as usize - eradicated
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::reduce_patterndb;
    use crate::index::full_index;
    use crate::pdb::generate::generate;
    use crate::pdb::pdb::{PdbError, UNREACHED};
    use crate::puzzle::scrambler::scramble_with_rng;
    use crate::tileset::Tileset;
    use rand::SeedableRng as _;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_rejects_zero_aware() {
        let ts: Tileset = "0,1".parse().unwrap();
        let mut pdb = generate(ts, 1);
        assert!(matches!(
            reduce_patterndb(&mut pdb),
            Err(PdbError::ZeroAware(_))
        ));
    }

    #[test]
    fn test_reduction_shrinks_and_preserves_lookups() {
        let ts: Tileset = "1,2,3".parse().unwrap();
        let original = generate(ts, 1);
        let mut reduced = generate(ts, 1);
        reduce_patterndb(&mut reduced).unwrap();

        let erased = reduced.bytes().iter().filter(|&&b| b == UNREACHED).count();
        assert!(erased > 0, "reduction erased nothing");

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(31);
        for _ in 0..64 {
            let p = scramble_with_rng(&mut rng);
            assert_eq!(reduced.hval(&p), original.hval(&p));
        }

        // Every entry resolves, erased or not.
        for i in (0..original.len()).step_by(11) {
            let p = original.config(i);
            assert_eq!(
                reduced.hval(&p),
                u32::from(original.lookup(full_index(ts, &p)))
            );
        }
    }

    #[test]
    fn test_reduction_is_idempotent() {
        let ts: Tileset = "1,2".parse().unwrap();
        let mut once = generate(ts, 1);
        reduce_patterndb(&mut once).unwrap();
        let snapshot: Vec<u8> = once.bytes().to_vec();

        reduce_patterndb(&mut once).unwrap();
        assert_eq!(once.bytes(), snapshot.as_slice());
    }
}
