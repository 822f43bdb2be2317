//! Iterative-deepening A*.
//!
//! The search runs depth-first with a cost bound, starting at the
//! catalogue's estimate for the start configuration. A branch is cut
//! as soon as moves made plus the heuristic exceed the bound, or when
//! the pruning automaton declares the move sequence redundant. The
//! least cost that exceeded the bound becomes the next bound.
//! Successors are tried in the fixed N, E, S, W order, which makes
//! expansion counts reproducible.

use bitflags::bitflags;
use itertools::Itertools as _;
use std::fmt::{self, Display};

use crate::catalogue::Catalogue;
use crate::puzzle::direction::Direction;
use crate::puzzle::puzzle::{moves, Puzzle};
use crate::search::fsm::Fsm;

bitflags! {
    /// Options for [`search_ida`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct IdaFlags: u32 {
        /// Complete the final iteration exhaustively instead of
        /// stopping at the first solution, so expansion counts are
        /// comparable across runs.
        const LAST_FULL = 1 << 0;
    }
}

/// An optimal solution: the tiles moved, in order. Sliding the empty
/// square onto each named tile's position in turn solves the start
/// configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    moves: Vec<u8>,
}

impl Path {
    /// The number of moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The moved tiles in order.
    #[must_use]
    pub fn tiles(&self) -> &[u8] {
        &self.moves
    }

    /// Replays the path on `p`.
    pub fn apply(&self, p: &mut Puzzle) {
        for &tile in &self.moves {
            p.slide(p.position_of(tile));
        }
    }
}

impl Display for Path {
    /// Formats the path as space-separated tile numbers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.moves.iter().format(" "))
    }
}

/// Progress report passed to the iteration callback of [`search_ida`].
#[derive(Clone, Copy, Debug)]
pub struct IdaIteration {
    /// The cost bound of the finished iteration.
    pub bound: u32,
    /// Nodes expanded so far, across all iterations.
    pub expansions: u64,
}

struct Dfs<'a> {
    cat: &'a Catalogue,
    fsm: &'a Fsm,
    threshold: u32,
    next: u32,
    expansions: u64,
    stack: Vec<u8>,
    found: Option<Vec<u8>>,
    last_full: bool,
}

impl Dfs<'_> {
    /// Bounded depth-first search. Returns true when the caller
    /// should unwind immediately.
    fn dfs(&mut self, p: &mut Puzzle, g: u32, state: u32) -> bool {
        self.expansions += 1;

        let f = g + self.cat.hval(p);
        if f > self.threshold {
            self.next = self.next.min(f);
            return false;
        }

        if p.is_solved() {
            if self.found.is_none() {
                self.found = Some(self.stack.clone());
            }
            return !self.last_full;
        }

        let zloc = p.zero_location();
        for &m in moves(zloc) {
            if m < 0 {
                continue;
            }
            let m = m as usize;
            let Some(next_state) = self.fsm.step(state, Direction::between(zloc, m)) else {
                continue;
            };

            let tile = p.tile_at(m);
            p.slide(m);
            self.stack.push(tile);
            let stop = self.dfs(p, g + 1, next_state);
            self.stack.pop();
            p.slide(zloc);
            if stop {
                return true;
            }
        }

        false
    }
}

/// Searches for an optimal solution of `start`, returning the path
/// and the number of node expansions. The start configuration must be
/// solvable; callers check with [`Puzzle::is_valid`].
///
/// `on_iteration` runs after every finished iteration with the bound
/// just searched and the cumulative expansion count.
pub fn search_ida(
    cat: &Catalogue,
    fsm: &Fsm,
    start: &Puzzle,
    flags: IdaFlags,
    on_iteration: Option<&dyn Fn(IdaIteration)>,
) -> (Path, u64) {
    let mut dfs = Dfs {
        cat,
        fsm,
        threshold: cat.hval(start),
        next: u32::MAX,
        expansions: 0,
        stack: Vec::new(),
        found: None,
        last_full: flags.contains(IdaFlags::LAST_FULL),
    };

    loop {
        dfs.next = u32::MAX;
        let mut p = start.clone();
        dfs.dfs(&mut p, 0, Fsm::START);

        if let Some(callback) = on_iteration {
            callback(IdaIteration {
                bound: dfs.threshold,
                expansions: dfs.expansions,
            });
        }

        if let Some(moves) = dfs.found.take() {
            return (Path { moves }, dfs.expansions);
        }

        assert!(dfs.next != u32::MAX, "search space exhausted");
        dfs.threshold = dfs.next;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{search_ida, IdaFlags, Path};
    use crate::catalogue::{Catalogue, CatalogueFlags};
    use crate::puzzle::compact::{pack, round, CompactPuzzle};
    use crate::puzzle::puzzle::Puzzle;
    use crate::search::fsm::Fsm;

    fn test_catalogue() -> Catalogue {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"1,2,5\n3,4,9\n0,6,7\n").unwrap();
        Catalogue::load(f.path(), None, CatalogueFlags::empty(), 1).unwrap()
    }

    #[test]
    fn test_solved_start() {
        let cat = test_catalogue();
        let (path, expansions) = search_ida(
            &cat,
            &Fsm::simple(),
            &Puzzle::solved(),
            IdaFlags::empty(),
            None,
        );
        assert_eq!(path.len(), 0);
        assert_eq!(path.to_string(), "");
        assert!(expansions >= 1);
    }

    #[test]
    fn test_single_move() {
        let cat = test_catalogue();
        let mut start = Puzzle::solved();
        start.slide(1);
        let (path, _) = search_ida(&cat, &Fsm::simple(), &start, IdaFlags::empty(), None);
        assert_eq!(path.len(), 1);
        assert_eq!(path.to_string(), "1");
    }

    #[test]
    fn test_three_move_scramble_expansion_bound() {
        let cat = test_catalogue();
        let mut start = Puzzle::solved();
        start.slide(1);
        start.slide(6);
        start.slide(7);
        let (path, expansions) =
            search_ida(&cat, &Fsm::simple(), &start, IdaFlags::empty(), None);
        assert_eq!(path.len(), 3);
        assert!(expansions <= 64, "expanded {expansions} nodes");
    }

    #[test]
    fn test_path_applies_to_solved() {
        let cat = test_catalogue();
        let mut start = Puzzle::solved();
        for m in [1, 2, 7, 6, 1, 0] {
            start.slide(m);
        }
        let (path, _) = search_ida(&cat, &Fsm::simple(), &start, IdaFlags::empty(), None);
        let mut replay = start.clone();
        path.apply(&mut replay);
        assert!(replay.is_solved());
    }

    #[test]
    fn test_optimal_lengths_match_bfs() {
        // Ground truth from a breadth-first sweep of the real graph.
        let cat = test_catalogue();
        let fsm = Fsm::simple();
        let mut cur = vec![pack(&Puzzle::solved(), 0)];
        let mut next: Vec<CompactPuzzle> = Vec::new();
        for depth in 1..=5usize {
            round(&mut next, &cur);
            for cp in next.iter().step_by(3) {
                let p = cp.unpack();
                let (path, _) = search_ida(&cat, &fsm, &p, IdaFlags::empty(), None);
                assert_eq!(path.len(), depth, "start {p}");
                let mut replay = p.clone();
                path.apply(&mut replay);
                assert!(replay.is_solved());
            }
            std::mem::swap(&mut cur, &mut next);
        }
    }

    #[test]
    fn test_long_scramble_solves_optimally() {
        // Twelve non-backtracking moves; the result can be no deeper
        // than twelve and must share its parity.
        let cat = test_catalogue();
        let mut start = Puzzle::solved();
        for m in [1, 6, 7, 12, 11, 16, 17, 18, 13, 8, 3, 2] {
            start.slide(m);
        }
        assert!(start.is_valid());
        let (path, expansions) =
            search_ida(&cat, &Fsm::simple(), &start, IdaFlags::empty(), None);
        assert!(path.len() <= 12);
        assert_eq!(path.len() % 2, 0);
        assert!(expansions >= 1);
        let mut replay = start.clone();
        path.apply(&mut replay);
        assert!(replay.is_solved());
    }

    #[test]
    fn test_last_full_counts_at_least_as_many_nodes() {
        let cat = test_catalogue();
        let fsm = Fsm::simple();
        let mut start = Puzzle::solved();
        for m in [5, 6, 1, 2] {
            start.slide(m);
        }
        let (short_path, short) = search_ida(&cat, &fsm, &start, IdaFlags::empty(), None);
        let (full_path, full) = search_ida(&cat, &fsm, &start, IdaFlags::LAST_FULL, None);
        assert_eq!(short_path, full_path);
        assert!(full >= short);
    }

    #[test]
    fn test_iteration_callback_reports_growing_bounds() {
        let cat = test_catalogue();
        let mut start = Puzzle::solved();
        for m in [1, 6, 11, 12, 7, 2] {
            start.slide(m);
        }
        let bounds = std::cell::RefCell::new(Vec::new());
        let callback = |it: super::IdaIteration| bounds.borrow_mut().push(it.bound);
        search_ida(&cat, &Fsm::simple(), &start, IdaFlags::empty(), Some(&callback));
        let bounds = bounds.into_inner();
        assert!(!bounds.is_empty());
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_path_display_roundtrip() {
        let path = Path { moves: vec![1, 6, 2] };
        assert_eq!(path.to_string(), "1 6 2");
        assert_eq!(path.tiles(), &[1, 6, 2]);
    }
}
