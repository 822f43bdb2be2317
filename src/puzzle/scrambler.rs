//! Random solvable configurations.
//!
//! The scrambler shuffles the 24 tiles over the non-home positions
//! with a parity-correcting final swap, then walks the empty square
//! to a uniformly chosen position with straight slides. Every
//! solvable configuration is equally likely.

use rand::Rng;

use crate::puzzle::puzzle::{Puzzle, TILE_COUNT, TRAY_WIDTH};

/// Produces a uniformly random solvable configuration using the given
/// RNG.
pub fn scramble_with_rng<R: Rng>(rng: &mut R) -> Puzzle {
    let mut p = Puzzle::solved();

    // Shuffle tiles over positions 1..25, tracking the permutation
    // sign. With the empty square on its home corner the sign must
    // stay even, which the final swap restores when needed.
    let n = TILE_COUNT - 1;
    let mut parity = false;
    for i in 0..n - 2 {
        let j = rng.random_range(i..n);
        if i != j {
            p.swap_positions(i + 1, j + 1);
            parity = !parity;
        }
    }
    if parity {
        p.swap_positions(n - 1, n);
    }

    // Slide the empty square to a random position; straight walks
    // keep the configuration reachable.
    let col = rng.random_range(0..TRAY_WIDTH);
    for c in 1..=col {
        p.slide(c);
    }
    let row = rng.random_range(0..TRAY_WIDTH);
    for r in 1..=row {
        p.slide(r * TRAY_WIDTH + col);
    }

    p
}

/// Equivalent to [`scramble_with_rng`] using [`rand::rng`].
#[cfg(feature = "thread_rng")]
#[must_use]
pub fn scramble() -> Puzzle {
    scramble_with_rng(&mut rand::rng())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::scramble_with_rng;
    use rand::SeedableRng as _;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_scrambles_are_valid() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for _ in 0..256 {
            let p = scramble_with_rng(&mut rng);
            assert!(p.is_valid());
        }
    }

    #[test]
    fn test_scrambles_vary() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let distinct: HashSet<_> = (0..64).map(|_| scramble_with_rng(&mut rng)).collect();
        assert!(distinct.len() > 60);
    }

    #[test]
    fn test_empty_square_reaches_all_positions() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let positions: HashSet<_> = (0..512)
            .map(|_| scramble_with_rng(&mut rng).zero_location())
            .collect();
        assert_eq!(positions.len(), 25);
    }
}
