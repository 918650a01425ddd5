//! Direction, per-node view hints and placement.

pub mod arrange;
pub mod direction;
pub mod hints;
