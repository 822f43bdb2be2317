//! Pattern database consistency verification.
//!
//! Four invariants hold for a correct table: every entry is finite,
//! directly reachable configurations differ by at most one move, all
//! members of an equivalence class share one distance, and every
//! configuration away from the goal has a neighbour exactly one move
//! closer. Together these are necessary and sufficient for the table
//! to be correct, so a generator bug cannot hide from this check.

use log::error;

use crate::index::full_index;
use crate::pdb::pdb::{for_each_class_member, for_each_neighbor, PatternDb, UNREACHED};
use crate::puzzle::puzzle::{Puzzle, ZERO_TILE};
use crate::tileset::Tileset;

/// Checks the neighbours of one class member: each must be within one
/// move of `dist`, and reaching one at `dist - 1` counts as progress.
/// Returns the number of violations.
fn verify_configuration(
    pdb: &PatternDb,
    p: &mut Puzzle,
    dist: u8,
    has_progress: &mut bool,
) -> u64 {
    let ts = pdb.tileset();
    let mut bad = 0;
    for_each_neighbor(ts, p, &mut |q: &mut Puzzle| {
        let nd = pdb.lookup(full_index(ts, q));
        if nd.abs_diff(dist) > 1 {
            error!(
                "neighbour at distance {nd}, not within 1 of {dist}:\n{}",
                q.display_grid()
            );
            bad += 1;
        }
        if dist == nd.wrapping_add(1) {
            *has_progress = true;
        }
    });
    bad
}

/// Checks one equivalence class, examined through its canonical
/// representative. Returns the number of violations found.
fn verify_eqclass(pdb: &PatternDb, p: &mut Puzzle, dist: u8) -> u64 {
    let ts = pdb.tileset();

    if dist == UNREACHED {
        error!("configuration is unreached:\n{}", p.display_grid());
        return 1;
    }

    // Each class is examined once, from its canonical member.
    if ts.contains(ZERO_TILE) && !Tileset::is_canonical(ts.eqclass(p), p) {
        return 0;
    }

    let mut bad = 0;
    let mut has_progress = false;
    for_each_class_member(ts, p, &mut |member: &mut Puzzle| {
        let md = pdb.lookup(full_index(ts, member));
        if md != dist {
            error!(
                "same equivalence class but distances {md} != {dist}:\n{}",
                member.display_grid()
            );
            bad += 1;
        } else {
            bad += verify_configuration(pdb, member, dist, &mut has_progress);
        }
    });

    if !has_progress && dist != 0 {
        error!(
            "no progress possible from distance {dist}:\n{}",
            p.display_grid()
        );
        bad += 1;
    }

    bad
}

/// Verifies an entire pattern database. Returns the number of
/// inconsistent configurations; zero means the table is internally
/// consistent.
#[must_use]
pub fn verify_patterndb(pdb: &PatternDb) -> u64 {
    let mut bad = 0;
    for i in 0..pdb.len() {
        let mut p = pdb.config(i);
        bad += verify_eqclass(pdb, &mut p, pdb.lookup(i));
    }
    bad
}

#[cfg(test)]
mod tests {
    use super::verify_patterndb;
    use crate::pdb::generate::generate;
    use crate::pdb::pdb::PatternDb;
    use crate::tileset::Tileset;

    #[test]
    fn test_fresh_tables_are_consistent() {
        for s in ["1,2", "0,1", "0,1,2", "1,2,3"] {
            let ts: Tileset = s.parse().unwrap();
            let pdb = generate(ts, 1);
            assert_eq!(verify_patterndb(&pdb), 0, "tileset {s}");
        }
    }

    #[test]
    fn test_detects_corruption() {
        let ts: Tileset = "1,2".parse().unwrap();
        let pdb = generate(ts, 1);
        let mut bytes = pdb.bytes().to_vec();
        // Push one entry two levels out.
        let victim = bytes.iter().position(|&b| b == 1).unwrap();
        bytes[victim] = 3;
        let corrupt = PatternDb::from_bytes(ts, bytes.into_boxed_slice()).unwrap();
        assert!(verify_patterndb(&corrupt) > 0);
    }

    #[test]
    fn test_detects_unreached_entry() {
        let ts: Tileset = "1,2".parse().unwrap();
        let pdb = generate(ts, 1);
        let mut bytes = pdb.bytes().to_vec();
        bytes[17] = super::UNREACHED;
        let corrupt = PatternDb::from_bytes(ts, bytes.into_boxed_slice()).unwrap();
        assert!(verify_patterndb(&corrupt) > 0);
    }
}
