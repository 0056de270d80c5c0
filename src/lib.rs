//! Tilt Passage - passage-building boards for a tilt maze
//!
//! Core modules:
//! - `sim`: Board simulation (grid, pieces, ball path, ball motion)
//! - `input`: Gesture handling and the gesture channel
//! - `renderer`: Draw data handed to the rendering backend
//! - `config`: Data-driven level configuration

pub mod config;
pub mod error;
pub mod input;
pub mod renderer;
pub mod sim;

pub use config::{MovablePassageConfig, PhysicsConfig, RotatablePassageConfig};
pub use error::{GestureError, LevelError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the native driver
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Anything smaller is treated as zero (time steps, speeds, crossing nudges)
    pub const FLOAT_ERROR: f32 = 0.0001;
    /// Vectors shorter than this are not normalized
    pub const LENGTH_TOO_SMALL_TO_NORMALIZE: f32 = 0.001;

    /// Models are exported spanning [-1, 1]
    pub const MODEL_SIZE: f32 = 2.0;
    /// Ball model diameter before scaling
    pub const BALL_MODEL_DIAMETER: f32 = 2.0;

    /// Rows of the fixed starting chute
    pub const ROWS_FOR_START: u32 = 3;
    /// Rows of the finish area
    pub const ROWS_FOR_END: u32 = 2;

    /// Off-board pieces are drawn at this fraction of a block
    pub const OFF_BOARD_SCALE: f32 = 2.0 / 3.0;

    /// Physics defaults
    pub const DRAG_CONSTANT: f32 = 0.2;
    pub const ACCELERATION_ADJUSTMENT: f32 = 0.25;
    /// Visual spin of the ball per unit of distance rolled
    pub const ROTATION_SCALE: f32 = 10.0;

    /// Gestures are cheaper than a redraw, so several are applied per frame
    pub const MAX_GESTURES_PER_FRAME: usize = 128;
}

/// Rotate a vector clockwise by a number of quarter turns
#[inline]
pub fn rotate_quarter_cw(v: Vec2, quarter_turns: u8) -> Vec2 {
    match quarter_turns % 4 {
        0 => v,
        1 => Vec2::new(v.y, -v.x),
        2 => -v,
        _ => Vec2::new(-v.y, v.x),
    }
}

/// Rotate a vector counter-clockwise by a number of quarter turns
#[inline]
pub fn rotate_quarter_ccw(v: Vec2, quarter_turns: u8) -> Vec2 {
    rotate_quarter_cw(v, (4 - quarter_turns % 4) % 4)
}
