//! Level construction errors
//!
//! Only construction can fail. Runtime board operations report "redraw
//! needed" instead of erroring.

use thiserror::Error;

/// A level that cannot be built from its configuration
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no playable pieces registered")]
    NoPieces,
    #[error("invalid board dimensions {rows}x{cols}")]
    InvalidDimensions { rows: u32, cols: u32 },
    #[error("{which} column {column} is outside a board {width} tiles wide")]
    ColumnOutOfRange {
        which: &'static str,
        column: u32,
        width: u32,
    },
    #[error("viewport must have a positive width and height, got {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
    #[error("{needed} pieces need off-board slots but only {available} exist")]
    NotEnoughOffBoardSlots { needed: usize, available: usize },
    #[error("rock at ({row}, {col}) is outside the on-board area")]
    RockOutOfRange { row: u32, col: u32 },
    #[error("maze has no cells")]
    EmptyMaze,
    #[error("maze cell ({row}, {col}) is outside the maze")]
    MazeCellOutOfRange { row: u32, col: u32 },
    #[error("maze cell ({row}, {col}) has no matching passage piece")]
    UnsupportedCell { row: u32, col: u32 },
    #[error("invalid locked path: {0}")]
    InvalidPath(String),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
}

/// A gesture that could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GestureError {
    #[error("gesture queue is full")]
    Full,
    #[error("gesture channel is closed")]
    Closed,
}
