//! Defines the [`Direction`] type: the four symbols a move of the
//! empty square can take, in the fixed N, E, S, W successor order.

use std::fmt::{self, Display, Write as _};

use crate::puzzle::puzzle::TRAY_WIDTH;

/// A direction of the empty square's movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// The empty square moves one row up.
    North,
    /// The empty square moves one column right.
    East,
    /// The empty square moves one row down.
    South,
    /// The empty square moves one column left.
    West,
}

impl Direction {
    /// All directions in successor order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The opposite direction.
    #[must_use]
    pub fn inverse(self) -> Self {
        // N <-> S and E <-> W differ in the second bit.
        Self::from_index(self as usize ^ 2)
    }

    /// The direction in which the empty square travels when it slides
    /// from `zloc` to the adjacent position `dloc`.
    #[must_use]
    pub fn between(zloc: usize, dloc: usize) -> Self {
        match dloc as isize - zloc as isize {
            d if d == -(TRAY_WIDTH as isize) => Self::North,
            1 => Self::East,
            d if d == TRAY_WIDTH as isize => Self::South,
            -1 => Self::West,
            d => unreachable!("positions {zloc} and {dloc} are not adjacent ({d})"),
        }
    }

    #[must_use]
    pub(crate) fn from_index(i: usize) -> Self {
        Self::ALL[i]
    }
}

impl Display for Direction {
    /// Formats the direction as an upper case character: N, E, S, W.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match self {
            Self::North => 'N',
            Self::East => 'E',
            Self::South => 'S',
            Self::West => 'W',
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Direction;
    use crate::puzzle::puzzle::{moves, TILE_COUNT};

    #[test]
    fn test_inverse() {
        assert_eq!(Direction::North.inverse(), Direction::South);
        assert_eq!(Direction::East.inverse(), Direction::West);
        for d in Direction::ALL {
            assert_eq!(d.inverse().inverse(), d);
        }
    }

    #[test]
    fn test_between_matches_move_table_order() {
        // The move table lists destinations in the same N, E, S, W
        // order that `between` reports.
        for z in 0..TILE_COUNT {
            let dirs: Vec<_> = moves(z)
                .iter()
                .filter(|&&m| m >= 0)
                .map(|&m| Direction::between(z, m as usize))
                .collect();
            let mut sorted = dirs.clone();
            sorted.sort();
            assert_eq!(dirs, sorted, "position {z}");
        }
    }
}
