//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by placement ID)
//! - No rendering or platform dependencies

pub mod board;
pub mod build;
pub mod motion;
pub mod path;
pub mod piece;
pub mod placement;
pub mod state;
pub mod tick;
pub mod wall;

pub use board::{Block, BlockRole, DragState, GameBoard};
pub use build::{GridMaze, MazeLayout, build_movable, build_rotatable};
pub use motion::{Exits, MotionParams, move_ball_in_cell};
pub use path::PathChange;
pub use piece::{ObjRef, PieceKind, TextureVariant};
pub use placement::{Catalog, Placement, PlacementId};
pub use state::{Ball, Level, LevelVariant, Viewport};
pub use tick::update_data;
pub use wall::{Wall, WallSet};
