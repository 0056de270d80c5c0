//! Cell walls and quarter-turn rotation
//!
//! Rows grow upward and columns grow rightward, so `Up` leads to `row + 1`.
//! A quarter turn is clockwise: Left -> Up -> Right -> Down -> Left.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One side of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wall {
    Left,
    Up,
    Right,
    Down,
}

impl Wall {
    /// All walls in clockwise order starting at `Left`
    pub const ALL: [Wall; 4] = [Wall::Left, Wall::Up, Wall::Right, Wall::Down];

    fn clockwise_index(self) -> u8 {
        match self {
            Wall::Left => 0,
            Wall::Up => 1,
            Wall::Right => 2,
            Wall::Down => 3,
        }
    }

    fn from_clockwise_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// Where this wall ends up after rotating its cell clockwise
    #[inline]
    pub fn rotated(self, quarter_turns: u8) -> Wall {
        Self::from_clockwise_index(self.clockwise_index() + quarter_turns % 4)
    }

    /// Inverse of [`Wall::rotated`]
    #[inline]
    pub fn unrotated(self, quarter_turns: u8) -> Wall {
        self.rotated((4 - quarter_turns % 4) % 4)
    }

    /// The facing wall of the neighbouring cell
    #[inline]
    pub fn opposite(self) -> Wall {
        self.rotated(2)
    }

    /// Left and Right walls bound the x axis
    #[inline]
    pub fn is_vertical_side(self) -> bool {
        matches!(self, Wall::Left | Wall::Right)
    }

    /// +1 for walls on the positive side of their axis
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Wall::Right | Wall::Up => 1.0,
            Wall::Left | Wall::Down => -1.0,
        }
    }

    /// Outward unit normal
    pub fn normal(self) -> Vec2 {
        match self {
            Wall::Left => Vec2::NEG_X,
            Wall::Up => Vec2::Y,
            Wall::Right => Vec2::X,
            Wall::Down => Vec2::NEG_Y,
        }
    }

    /// Row/column step taken when leaving a cell through this wall
    pub fn step(self) -> (i32, i32) {
        match self {
            Wall::Left => (0, -1),
            Wall::Up => (1, 0),
            Wall::Right => (0, 1),
            Wall::Down => (-1, 0),
        }
    }
}

/// A set of walls packed into four bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WallSet(u8);

impl WallSet {
    pub const EMPTY: WallSet = WallSet(0);
    pub const ALL: WallSet = WallSet(0b1111);

    fn bit(wall: Wall) -> u8 {
        1 << wall.clockwise_index()
    }

    pub fn of(walls: &[Wall]) -> Self {
        walls.iter().fold(Self::EMPTY, |set, &w| set.with(w))
    }

    #[inline]
    pub fn contains(self, wall: Wall) -> bool {
        self.0 & Self::bit(wall) != 0
    }

    #[inline]
    pub fn with(self, wall: Wall) -> Self {
        Self(self.0 | Self::bit(wall))
    }

    pub fn insert(&mut self, wall: Wall) {
        *self = self.with(wall);
    }

    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn complement(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }

    /// Rotate every wall in the set clockwise
    pub fn rotated(self, quarter_turns: u8) -> Self {
        Wall::ALL
            .iter()
            .filter(|w| self.contains(**w))
            .fold(Self::EMPTY, |set, w| set.with(w.rotated(quarter_turns)))
    }

    pub fn iter(self) -> impl Iterator<Item = Wall> {
        Wall::ALL.into_iter().filter(move |w| self.contains(*w))
    }
}
