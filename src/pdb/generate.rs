//! Pattern database generation.
//!
//! Distances are grown breadth-first in the equivalence graph: round
//! `d` scans the index space for entries at distance `d`, expands the
//! canonical representative of each class through every pattern tile
//! move, and writes `d + 1` to each member of every class reached for
//! the first time. The scan runs in parallel chunks; the table is a
//! slice of atomic bytes during generation, so concurrent writers
//! settling the same class agree on the value they store.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use log::debug;

use crate::index::{full_index, invert_index, search_space_size, split_index};
use crate::pdb::parallel::iterate_parallel;
use crate::pdb::pdb::{for_each_neighbor, PatternDb, UNREACHED};
use crate::puzzle::puzzle::{Puzzle, ZERO_TILE};
use crate::tileset::Tileset;

/// Marks every member index of `p`'s equivalence class that is still
/// unreached with `dist`, counting fresh marks into `found`.
fn settle_class(
    ts: Tileset,
    table: &[AtomicU8],
    p: &mut Puzzle,
    dist: u8,
    found: &AtomicU64,
) {
    if ts.contains(ZERO_TILE) {
        let zloc = p.zero_location();
        for c in ts.eqclass(p).iter() {
            p.slide(c as usize);
            let idx = full_index(ts, p) as usize;
            if table[idx]
                .compare_exchange(UNREACHED, dist, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                found.fetch_add(1, Ordering::Relaxed);
            }
        }
        p.slide(zloc);
    } else {
        let idx = full_index(ts, p) as usize;
        if table[idx]
            .compare_exchange(UNREACHED, dist, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            found.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Generates the pattern database for `ts` using up to `jobs` worker
/// threads.
#[must_use]
pub fn generate(ts: Tileset, jobs: usize) -> PatternDb {
    let size = search_space_size(ts);
    let table: Vec<AtomicU8> = (0..size).map(|_| AtomicU8::new(UNREACHED)).collect();

    let seeded = AtomicU64::new(0);
    let mut solved = Puzzle::solved();
    settle_class(ts, &table, &mut solved, 0, &seeded);
    debug!("tileset {ts}: {} configurations at distance 0", seeded.into_inner());

    let zero_aware = ts.contains(ZERO_TILE);
    let mut round: u8 = 0;
    loop {
        let found = AtomicU64::new(0);
        iterate_parallel(jobs, size, |start, n| {
            for i in start..start + n {
                if table[i as usize].load(Ordering::Relaxed) != round {
                    continue;
                }

                let mut p = invert_index(ts, split_index(ts, i));
                if zero_aware && !Tileset::is_canonical(ts.eqclass(&p), &p) {
                    continue;
                }

                for_each_neighbor(ts, &mut p, &mut |q: &mut Puzzle| {
                    settle_class(ts, &table, q, round + 1, &found);
                });
            }
        });

        let found = found.into_inner();
        debug!("tileset {ts}: {found} configurations at distance {}", round + 1);
        if found == 0 {
            break;
        }

        round += 1;
        // 0xfe is the reducer's working sentinel and 0xff is
        // UNREACHED; distances must stay below both.
        assert!(round < UNREACHED - 2, "distance exceeds the byte range");
    }

    let bytes: Vec<u8> = table.into_iter().map(AtomicU8::into_inner).collect();
    PatternDb::from_heap(ts, bytes.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::generate;
    use crate::index::{full_index, search_space_size};
    use crate::pdb::pdb::UNREACHED;
    use crate::puzzle::compact::{pack, round as bfs_round, CompactPuzzle};
    use crate::puzzle::puzzle::Puzzle;
    use crate::tileset::Tileset;

    #[test]
    fn test_solved_entry_is_zero() {
        for s in ["1,2", "0,1,2"] {
            let ts: Tileset = s.parse().unwrap();
            let pdb = generate(ts, 1);
            assert_eq!(pdb.len(), search_space_size(ts));
            assert_eq!(pdb.lookup(full_index(ts, &Puzzle::solved())), 0);
        }
    }

    #[test]
    fn test_every_entry_reached() {
        for s in ["1,2", "0,1", "0,1,2"] {
            let ts: Tileset = s.parse().unwrap();
            let pdb = generate(ts, 1);
            assert!(
                pdb.bytes().iter().all(|&b| b != UNREACHED),
                "tileset {s} has unreached entries"
            );
        }
    }

    #[test]
    fn test_parallel_generation_matches_serial() {
        let ts: Tileset = "0,1,2".parse().unwrap();
        let serial = generate(ts, 1);
        let parallel = generate(ts, 4);
        assert_eq!(serial.bytes(), parallel.bytes());
    }

    #[test]
    fn test_histogram_counts_all_entries() {
        let ts: Tileset = "1,2".parse().unwrap();
        let pdb = generate(ts, 1);
        let histogram = pdb.histogram();
        assert_eq!(histogram.iter().sum::<u64>(), pdb.len());
        assert_eq!(histogram[0], 1);
        assert!(pdb.classes() >= 2);
    }

    #[test]
    fn test_admissible_against_real_distances() {
        // Walk the real puzzle graph breadth-first; no entry may
        // exceed the true distance of any configuration mapping to it.
        let tilesets: Vec<Tileset> =
            ["1,2", "0,1,2"].iter().map(|s| s.parse().unwrap()).collect();
        let pdbs: Vec<_> = tilesets.iter().map(|&ts| generate(ts, 1)).collect();

        let mut cur = vec![pack(&Puzzle::solved(), 0)];
        let mut next: Vec<CompactPuzzle> = Vec::new();
        for depth in 1..=6u32 {
            bfs_round(&mut next, &cur);
            for cp in &next {
                let p = cp.unpack();
                for (ts, pdb) in tilesets.iter().zip(&pdbs) {
                    assert!(
                        u32::from(pdb.lookup(full_index(*ts, &p))) <= depth,
                        "inadmissible entry at depth {depth}"
                    );
                }
            }
            std::mem::swap(&mut cur, &mut next);
        }
    }
}
