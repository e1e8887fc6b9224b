use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::graph::Direction;

bitflags! {
    /// The window edges a resize acts on. Corners are two edges at once.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Edges: u8 {
        const LEFT = 0b0001;
        const RIGHT = 0b0010;
        const UP = 0b0100;
        const DOWN = 0b1000;

        const LEFT_UP = Self::LEFT.bits() | Self::UP.bits();
        const LEFT_DOWN = Self::LEFT.bits() | Self::DOWN.bits();
        const RIGHT_UP = Self::RIGHT.bits() | Self::UP.bits();
        const RIGHT_DOWN = Self::RIGHT.bits() | Self::DOWN.bits();
    }
}

impl Edges {
    /// The single-edge directions contained in this set, horizontal first.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        [
            (Edges::LEFT, Direction::Left),
            (Edges::RIGHT, Direction::Right),
            (Edges::UP, Direction::Up),
            (Edges::DOWN, Direction::Down),
        ]
        .into_iter()
        .filter(move |(edge, _)| self.contains(*edge))
        .map(|(_, direction)| direction)
    }
}

impl From<Direction> for Edges {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => Edges::LEFT,
            Direction::Right => Edges::RIGHT,
            Direction::Up => Edges::UP,
            Direction::Down => Edges::DOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_expands_to_two_directions() {
        let dirs: Vec<_> = Edges::RIGHT_DOWN.directions().collect();
        assert_eq!(dirs, vec![Direction::Right, Direction::Down]);
        assert_eq!(Edges::from(Direction::Up), Edges::UP);
        assert_eq!(Edges::empty().directions().count(), 0);
    }
}
