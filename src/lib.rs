//! Pattern database toolkit for the 24-puzzle.
//!
//! The crate models the 5x5 sliding-tile puzzle, builds admissible
//! heuristics from pattern databases over subsets of the tiles, and
//! solves puzzle instances optimally with iterative-deepening A*.

#![allow(clippy::module_inception)]

pub mod catalogue;
pub mod index;
pub mod pdb;
pub mod puzzle;
pub mod search;
pub mod tileset;
