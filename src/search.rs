//! Optimal solving: the move-sequence pruning automaton, the
//! iterative-deepening A* search, and the multi-puzzle worker pool.

pub mod driver;
pub mod fsm;
pub mod ida;
