use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction the diagram grows in, from the root outwards.
///
/// The only transition is [`Direction::rotate`]: one quarter turn forward,
/// RIGHT → DOWN → LEFT → UP → RIGHT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    /// Next direction in the cycle. Total; applying it four times is the identity.
    pub fn rotate(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    /// Angle the toolbar flow icon is drawn at for this direction.
    pub fn rotation_degrees(self) -> u16 {
        match self {
            Direction::Left => 90,
            Direction::Up => 180,
            Direction::Right => 270,
            Direction::Down => 360,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }

    /// Map (depth, breadth) distances onto screen (x, y).
    pub(crate) fn orient(self, depth: f32, breadth: f32) -> (f32, f32) {
        match self {
            Direction::Right => (depth, breadth),
            Direction::Left => (-depth, breadth),
            Direction::Down => (breadth, depth),
            Direction::Up => (breadth, -depth),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Right => "RIGHT",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Up => "UP",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
