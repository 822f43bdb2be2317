//! Pattern databases: generation, storage, reduction, verification
//! and statistics.

pub mod generate;
pub mod parallel;
pub mod pdb;
pub mod reduce;
pub mod stats;
pub mod verify;
