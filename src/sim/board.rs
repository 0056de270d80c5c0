//! Game board grid
//!
//! Owns the blocks, the placement arena and the in-progress drag. Row 0 is
//! the bottom of the board.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::piece::PieceKind;
use super::placement::{Catalog, Placement, PlacementId};
use super::wall::Wall;
use crate::error::LevelError;

/// What a cell is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockRole {
    /// Fixed starting chute
    Begin,
    /// Tunnel building area
    OnBoard,
    /// Staging slots and solid surroundings
    OffBoard,
    /// Finish
    End,
}

/// One grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub center: Vec3,
    pub role: BlockRole,
    pub primary: Option<PlacementId>,
    /// Filler hidden under a movable piece
    pub secondary: Option<PlacementId>,
}

/// A piece picked up and not yet dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragState {
    pub row: u32,
    pub col: u32,
    pub placement: PlacementId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBoard {
    rows: u32,
    cols: u32,
    block_size: f32,
    center: Vec3,
    /// Rows at the top drawn as one tall finish strip
    end_rows: u32,
    /// Finishing cell for boards without an `End` block
    goal: Option<(u32, u32)>,
    blocks: Vec<Block>,
    pub catalog: Catalog,
    drag: Option<DragState>,
}

impl GameBoard {
    pub fn new(
        rows: u32,
        cols: u32,
        block_size: f32,
        center: Vec3,
        end_rows: u32,
    ) -> Result<Self, LevelError> {
        if rows == 0 || cols == 0 || end_rows > rows || !(block_size > 0.0) {
            return Err(LevelError::InvalidDimensions { rows, cols });
        }
        let cells = rows
            .checked_mul(cols)
            .ok_or(LevelError::InvalidDimensions { rows, cols })?;
        let mut board = Self {
            rows,
            cols,
            block_size,
            center,
            end_rows,
            goal: None,
            blocks: Vec::with_capacity(cells as usize),
            catalog: Catalog::new(),
            drag: None,
        };
        for row in 0..rows {
            for col in 0..cols {
                let center = board.position(row, col);
                board.blocks.push(Block {
                    center,
                    role: BlockRole::OffBoard,
                    primary: None,
                    secondary: None,
                });
            }
        }
        Ok(board)
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn width(&self) -> f32 {
        self.cols as f32 * self.block_size
    }

    pub fn height(&self) -> f32 {
        self.rows as f32 * self.block_size
    }

    pub fn end_rows(&self) -> u32 {
        self.end_rows
    }

    pub fn set_goal(&mut self, row: u32, col: u32) {
        self.goal = Some((row, col));
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| (row * self.cols + col) as usize)
    }

    pub fn block(&self, row: u32, col: u32) -> Option<&Block> {
        self.index(row, col).map(|i| &self.blocks[i])
    }

    pub fn block_mut(&mut self, row: u32, col: u32) -> Option<&mut Block> {
        self.index(row, col).map(move |i| &mut self.blocks[i])
    }

    pub fn blocks(&self) -> impl Iterator<Item = (u32, u32, &Block)> {
        let cols = self.cols;
        self.blocks
            .iter()
            .enumerate()
            .map(move |(i, b)| (i as u32 / cols, i as u32 % cols, b))
    }

    pub fn role(&self, row: u32, col: u32) -> Option<BlockRole> {
        self.block(row, col).map(|b| b.role)
    }

    pub fn set_role(&mut self, row: u32, col: u32, role: BlockRole) {
        if let Some(block) = self.block_mut(row, col) {
            block.role = role;
        }
    }

    pub fn primary_at(&self, row: u32, col: u32) -> Option<PlacementId> {
        self.block(row, col).and_then(|b| b.primary)
    }

    pub fn secondary_at(&self, row: u32, col: u32) -> Option<PlacementId> {
        self.block(row, col).and_then(|b| b.secondary)
    }

    /// Add a placement and make it the primary of its cell
    pub fn place(&mut self, placement: Placement) -> PlacementId {
        let (row, col) = (placement.row, placement.col);
        let id = self.catalog.add(placement);
        if let Some(block) = self.block_mut(row, col) {
            block.primary = Some(id);
        }
        id
    }

    /// Add a filler: primary when the cell is empty, secondary otherwise
    pub fn place_filler(&mut self, placement: Placement) -> PlacementId {
        let (row, col) = (placement.row, placement.col);
        let id = self.catalog.add(placement);
        if let Some(block) = self.block_mut(row, col) {
            if block.primary.is_none() {
                block.primary = Some(id);
            } else {
                block.secondary = Some(id);
            }
        }
        id
    }

    /// World-space center of a cell's floor
    pub fn position(&self, row: u32, col: u32) -> Vec3 {
        let bs = self.block_size;
        let x = bs * (col as f32 + 0.5) - self.width() / 2.0 + self.center.x;
        if self.end_rows > 0 && row >= self.rows - self.end_rows {
            let y = bs * (self.rows as f32 - self.end_rows as f32 / 2.0) - self.height() / 2.0
                + self.center.y;
            Vec3::new(x, y, self.end_z())
        } else {
            let y = bs * (row as f32 + 0.5) - self.height() / 2.0 + self.center.y;
            Vec3::new(x, y, self.center.z - bs / 2.0)
        }
    }

    /// The finish strip sits below the tunnel floor
    pub fn end_z(&self) -> f32 {
        self.center.z - 3.0 * self.block_size / 4.0
    }

    /// Map a world point onto the grid, clamping to the nearest cell
    pub fn cell_at(&self, point: Vec2) -> (u32, u32) {
        fn axis(value: f32, center: f32, extent: f32, count: u32) -> u32 {
            let t = ((value - center) / extent + 0.5) * count as f32;
            // NaN maps to 0 and infinities saturate
            (t.floor().max(0.0) as u32).min(count - 1)
        }
        let row = axis(point.y, self.center.y, self.height(), self.rows);
        let col = axis(point.x, self.center.x, self.width(), self.cols);
        (row, col)
    }

    /// The adjacent cell through `wall`, if it is on the grid
    pub fn neighbor(&self, row: u32, col: u32, wall: Wall) -> Option<(u32, u32)> {
        let (dr, dc) = wall.step();
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < self.rows && c < self.cols).then_some((r, c))
    }

    /// Whether the ball reaching this cell ends the level
    pub fn is_goal(&self, row: u32, col: u32) -> bool {
        self.role(row, col) == Some(BlockRole::End) || self.goal == Some((row, col))
    }

    /// Whether the cell lets the ball in through `wall` (board frame)
    fn open_from(&self, row: u32, col: u32, wall: Wall) -> bool {
        let Some(block) = self.block(row, col) else {
            return false;
        };
        match block.role {
            BlockRole::End => true,
            BlockRole::OffBoard => false,
            BlockRole::Begin | BlockRole::OnBoard => block
                .primary
                .and_then(|id| self.catalog.get(id))
                .is_some_and(|p| !p.has_wall_at(wall)),
        }
    }

    fn can_enter(&self, row: u32, col: u32, wall: Wall) -> bool {
        self.neighbor(row, col, wall)
            .is_some_and(|(r, c)| self.open_from(r, c, wall.opposite()))
    }

    fn diagonal_open(&self, row: u32, col: u32, first: Wall, second: Wall) -> bool {
        self.neighbor(row, col, first)
            .filter(|&(r, c)| self.open_from(r, c, first.opposite()))
            .and_then(|(r, c)| self.neighbor(r, c, second))
            .is_some_and(|(r, c)| self.open_from(r, c, second.opposite()))
    }

    /// Decide which of two exit walls the ball may pass through
    ///
    /// The walls are in the frame of the piece at `(row, col)`. When both are
    /// given the ball is heading for a corner: the diagonal move is granted
    /// if either ordered route to the diagonal cell is open. Otherwise the
    /// first wall that leads into an open neighbour wins.
    pub fn next_wall_candidates(
        &self,
        wall1: Option<Wall>,
        wall2: Option<Wall>,
        row: u32,
        col: u32,
    ) -> (bool, bool) {
        let turns = self
            .primary_at(row, col)
            .and_then(|id| self.catalog.get(id))
            .map_or(0, |p| p.quarter_turns);
        let actual1 = wall1.map(|w| w.rotated(turns));
        let actual2 = wall2.map(|w| w.rotated(turns));

        if let (Some(a1), Some(a2)) = (actual1, actual2) {
            if self.diagonal_open(row, col, a1, a2) || self.diagonal_open(row, col, a2, a1) {
                return (true, true);
            }
        }

        if actual1.is_some_and(|w| self.can_enter(row, col, w)) {
            (true, false)
        } else if actual2.is_some_and(|w| self.can_enter(row, col, w)) {
            (false, true)
        } else {
            (false, false)
        }
    }

    /// The piece in this cell if the player may pick it up or turn it
    pub fn movable_at(&self, row: u32, col: u32) -> Option<PlacementId> {
        let block = self.block(row, col)?;
        if !matches!(block.role, BlockRole::OnBoard | BlockRole::OffBoard) {
            return None;
        }
        let id = block.primary?;
        let placement = self.catalog.get(id)?;
        (!placement.kind.is_filler() && !placement.is_locked()).then_some(id)
    }

    pub fn drag(&self) -> Option<DragState> {
        self.drag
    }

    /// Drop the current drag and snap its piece back
    pub fn cancel_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if let Some(p) = self.catalog.get_mut(drag.placement) {
            p.move_progress = None;
        }
        log::debug!("drag from ({}, {}) cancelled", drag.row, drag.col);
        true
    }

    /// Start or continue dragging the piece under `start`
    ///
    /// Returns true when something needs redrawing.
    pub fn begin_drag(&mut self, start: Vec2, delta: Vec2) -> bool {
        let (row, col) = self.cell_at(start);
        let mut cancelled = false;
        if self.drag.is_some_and(|d| (d.row, d.col) != (row, col)) {
            cancelled = self.cancel_drag();
        }

        match self.drag {
            Some(drag) => {
                // The ball may have rolled into the held piece since the last gesture
                if self.catalog.get(drag.placement).is_none_or(|p| p.is_locked()) {
                    self.cancel_drag();
                    return true;
                }
                if let Some(progress) = self
                    .catalog
                    .get_mut(drag.placement)
                    .and_then(|p| p.move_progress.as_mut())
                {
                    *progress += delta;
                }
                true
            }
            None => {
                let Some(id) = self.movable_at(row, col) else {
                    return cancelled;
                };
                self.catalog[id].move_progress = Some(start + delta);
                self.drag = Some(DragState {
                    row,
                    col,
                    placement: id,
                });
                log::debug!(
                    "drag started on {} at ({}, {})",
                    self.catalog[id].kind.name(),
                    row,
                    col
                );
                true
            }
        }
    }

    /// Drop the dragged piece at `at`
    ///
    /// The piece moves only onto an empty slot, one whose primary is the
    /// filler for its role. Any other drop snaps the piece back. Returns
    /// false only when no drag was open.
    pub fn end_drag(&mut self, at: Vec2) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let moving = drag.placement;
        if let Some(p) = self.catalog.get_mut(moving) {
            p.move_progress = None;
        }

        let (row, col) = self.cell_at(at);
        if (row, col) == (drag.row, drag.col) {
            log::debug!("drag dropped on its own cell");
            return true;
        }
        if self.catalog.get(moving).is_none_or(|p| p.is_locked()) {
            log::debug!("piece at ({}, {}) joined the ball path mid-drag", drag.row, drag.col);
            return true;
        }

        let filler = self.block(row, col).and_then(|target| {
            let id = target.primary?;
            let kind = self.catalog.get(id)?.kind;
            match (target.role, kind) {
                (BlockRole::OnBoard, PieceKind::Dirt) | (BlockRole::OffBoard, PieceKind::Rock) => {
                    Some(id)
                }
                _ => None,
            }
        });
        let Some(filler) = filler else {
            log::debug!("drop on ({}, {}) rejected", row, col);
            return true;
        };

        if let Some(p) = self.catalog.get_mut(moving) {
            p.row = row;
            p.col = col;
        }
        if let Some(target) = self.block_mut(row, col) {
            target.primary = Some(moving);
            target.secondary = Some(filler);
        }
        if let Some(origin) = self.block_mut(drag.row, drag.col) {
            origin.primary = origin.secondary.take();
        }
        log::debug!(
            "moved piece from ({}, {}) to ({}, {})",
            drag.row,
            drag.col,
            row,
            col
        );
        true
    }

    /// Turn the piece under `at` a quarter turn
    pub fn tap(&mut self, at: Vec2) -> bool {
        let (row, col) = self.cell_at(at);
        let Some(id) = self.movable_at(row, col) else {
            return false;
        };
        self.catalog[id].rotate_quarter();
        log::debug!(
            "rotated {} at ({}, {}) to {} degrees",
            self.catalog[id].kind.name(),
            row,
            col,
            self.catalog[id].rotation_degrees()
        );
        true
    }
}
