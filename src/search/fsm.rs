//! Defines the [`Fsm`] type: a deterministic automaton over move
//! directions that prunes useless move sequences during search.
//!
//! The built-in automaton rejects only the immediate reversal of the
//! previous move. Larger automata pruning longer redundant sequences
//! can be loaded from a binary image: a little-endian state count
//! followed by four little-endian transitions per state, where
//! `u32::MAX` denotes the dead state.

use std::io::{self, Read};

use thiserror::Error;

use crate::puzzle::direction::Direction;

const DEAD: u32 = u32::MAX;

/// Upper bound on the number of states a loaded automaton may have.
const MAX_STATES: u32 = 1 << 24;

/// A move-sequence pruning automaton.
pub struct Fsm {
    states: Vec<[u32; 4]>,
}

/// Error type for [`Fsm::load`].
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("Io: {0}")]
    Io(#[from] io::Error),

    /// The image declares an unreasonable state count.
    #[error("TooLarge: {0} states exceed the supported maximum")]
    TooLarge(u32),

    /// A transition leads to a state outside the table.
    #[error("BadTransition: state {state} has a transition to {target}")]
    BadTransition { state: u32, target: u32 },
}

impl Fsm {
    /// The state a search starts in.
    pub const START: u32 = 0;

    /// The automaton that forbids exactly the immediate reversal of
    /// the previous move: one start state plus one state per
    /// remembered direction.
    #[must_use]
    pub fn simple() -> Self {
        let mut states = vec![[0u32; 4]; 5];
        for s in 0..5 {
            for d in 0..4 {
                states[s][d] = if s > 0 && d == (s - 1) ^ 2 {
                    DEAD
                } else {
                    d as u32 + 1
                };
            }
        }
        Self { states }
    }

    /// Advances the automaton by one move. `None` means the move
    /// sequence is redundant and the branch can be pruned.
    #[inline]
    #[must_use]
    pub fn step(&self, state: u32, dir: Direction) -> Option<u32> {
        let next = self.states[state as usize][dir as usize];
        (next != DEAD).then_some(next)
    }

    /// Reads an automaton from its binary image.
    pub fn load<R: Read>(r: &mut R) -> Result<Self, FsmError> {
        let mut word = [0u8; 4];
        r.read_exact(&mut word)?;
        let count = u32::from_le_bytes(word);
        if count == 0 || count > MAX_STATES {
            return Err(FsmError::TooLarge(count));
        }

        let mut states = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut state = [0u32; 4];
            for t in &mut state {
                r.read_exact(&mut word)?;
                *t = u32::from_le_bytes(word);
            }
            states.push(state);
        }

        for (s, state) in states.iter().enumerate() {
            for &target in state {
                if target != DEAD && target >= count {
                    return Err(FsmError::BadTransition {
                        state: s as u32,
                        target,
                    });
                }
            }
        }

        Ok(Self { states })
    }
}

#[cfg(test)]
mod tests {
    use super::{Fsm, FsmError, DEAD};
    use crate::puzzle::direction::Direction;

    #[test]
    fn test_simple_rejects_only_reversals() {
        let fsm = Fsm::simple();
        for first in Direction::ALL {
            let s = fsm.step(Fsm::START, first).unwrap();
            for second in Direction::ALL {
                let next = fsm.step(s, second);
                assert_eq!(next.is_none(), second == first.inverse());
            }
        }
    }

    #[test]
    fn test_load_roundtrip() {
        let mut image = Vec::new();
        image.extend_from_slice(&2u32.to_le_bytes());
        for t in [1u32, 1, 0, DEAD, 0, 0, 1, 1] {
            image.extend_from_slice(&t.to_le_bytes());
        }
        let fsm = Fsm::load(&mut image.as_slice()).unwrap();
        assert_eq!(fsm.step(0, Direction::South), Some(0));
        assert_eq!(fsm.step(0, Direction::West), None);
        assert_eq!(fsm.step(1, Direction::East), Some(0));
    }

    #[test]
    fn test_load_rejects_bad_transition() {
        let mut image = Vec::new();
        image.extend_from_slice(&1u32.to_le_bytes());
        for t in [0u32, 0, 0, 7] {
            image.extend_from_slice(&t.to_le_bytes());
        }
        assert!(matches!(
            Fsm::load(&mut image.as_slice()),
            Err(FsmError::BadTransition { .. })
        ));
    }

    #[test]
    fn test_load_rejects_truncated_image() {
        let image = 4u32.to_le_bytes();
        assert!(matches!(
            Fsm::load(&mut image.as_slice()),
            Err(FsmError::Io(_))
        ));
    }
}
