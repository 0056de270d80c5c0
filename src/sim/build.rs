//! Level construction
//!
//! Lays out the grid for a viewport, sites the fixed and playable pieces and
//! places the ball. Construction is the only place a level can fail.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::{BlockRole, GameBoard};
use super::piece::PieceKind;
use super::placement::Placement;
use super::state::{Ball, Level, LevelVariant, Viewport};
use super::wall::{Wall, WallSet};
use crate::config::{MovablePassageConfig, RotatablePassageConfig};
use crate::consts::*;
use crate::error::LevelError;

/// Grid dimensions chosen for a movable board
#[derive(Debug, Clone, Copy, PartialEq)]
struct MovableLayout {
    tile: f32,
    extra_cols: u32,
    extra_rows: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl MovableLayout {
    /// Largest tiles that fit, optionally shrunk by whole rings of staging slots
    ///
    /// Fails when the resulting grid cannot be indexed.
    fn fit(
        tiles_x: u32,
        tiles_y: u32,
        viewport: &Viewport,
        perimeters: u32,
    ) -> Result<Self, LevelError> {
        let fixed_rows = tiles_y as f32 + (ROWS_FOR_START + ROWS_FOR_END) as f32;
        let (w, h) = (viewport.width, viewport.height);
        let tile = (w / (tiles_x as f32 + 2.0 * perimeters as f32))
            .min(h / (fixed_rows + 2.0 * perimeters as f32));
        let extra_cols = (w / tile - tiles_x as f32 + FLOAT_ERROR).floor().max(0.0) as u32;
        let extra_rows = (h / tile - fixed_rows + FLOAT_ERROR).floor().max(0.0) as u32;
        let layout = Self {
            tile,
            extra_cols,
            extra_rows,
            tiles_x,
            tiles_y,
        };
        let rows = tiles_y
            .checked_add(extra_rows)
            .and_then(|r| r.checked_add(ROWS_FOR_START + ROWS_FOR_END));
        let cols = tiles_x.checked_add(extra_cols);
        match (rows, cols) {
            (Some(rows), Some(cols)) if rows.checked_mul(cols).is_some() => Ok(layout),
            _ => Err(LevelError::InvalidDimensions {
                rows: tiles_y,
                cols: tiles_x,
            }),
        }
    }

    fn rows(&self) -> u32 {
        self.tiles_y + self.extra_rows + ROWS_FOR_START + ROWS_FOR_END
    }

    fn cols(&self) -> u32 {
        self.tiles_x + self.extra_cols
    }

    /// Bottom-left cell of the building area
    fn origin(&self) -> (u32, u32) {
        (ROWS_FOR_START + self.extra_rows / 2, self.extra_cols / 2)
    }

    /// Staging cells: everything between the chute and the finish that is
    /// neither building area nor one of the fixed tunnels
    fn staging_slots(&self) -> usize {
        let middle = (self.tiles_y + self.extra_rows) as usize * self.cols() as usize;
        middle - self.tiles_x as usize * self.tiles_y as usize - self.extra_rows as usize
    }
}

/// Build a movable passage level for `viewport`
pub fn build_movable(
    config: &MovablePassageConfig,
    viewport: Viewport,
) -> Result<Level, LevelError> {
    config.validate()?;
    let (nx, ny) = (config.number_tiles_x, config.number_tiles_y);
    let needed = config.playable_pieces() as usize;

    let mut perimeters = 0;
    let layout = loop {
        let layout = MovableLayout::fit(nx, ny, &viewport, perimeters)?;
        let available = layout.staging_slots();
        if available >= needed {
            break layout;
        }
        if perimeters as usize > needed {
            return Err(LevelError::NotEnoughOffBoardSlots { needed, available });
        }
        perimeters = if perimeters == 0 {
            ((needed - available) / (2 * (nx as usize + ny as usize)) + 1) as u32
        } else {
            perimeters + 1
        };
    };

    let (rows, cols, tile) = (layout.rows(), layout.cols(), layout.tile);
    let center = Vec3::new(
        0.0,
        (viewport.height - rows as f32 * tile) / 2.0,
        viewport.floor_z,
    );
    let mut board = GameBoard::new(rows, cols, tile, center, ROWS_FOR_END)?;
    let (row0, col0) = layout.origin();
    let start_col = col0 + config.start_column;
    let end_col = col0 + config.end_column;
    let first_end_row = rows - ROWS_FOR_END;

    for row in row0..row0 + ny {
        for col in col0..col0 + nx {
            board.set_role(row, col, BlockRole::OnBoard);
        }
    }

    // Fixed tunnels through the staging rows below and above the building area
    let tunnel_rows = (ROWS_FOR_START..row0)
        .map(|row| (row, start_col))
        .chain((row0 + ny..first_end_row).map(|row| (row, end_col)));
    for (row, col) in tunnel_rows {
        board.set_role(row, col, BlockRole::OnBoard);
        board.place(Placement::new(PieceKind::Straight, row, col, 0, true));
    }

    add_starting_chute(&mut board, start_col);

    board.set_role(first_end_row, end_col, BlockRole::End);

    // Playable pieces go into the staging slots, bottom row first
    let quotas = [
        (PieceKind::Straight, config.straight.number_placements),
        (PieceKind::Turn, config.turn.number_placements),
        (PieceKind::TJunction, config.t_junction.number_placements),
        (PieceKind::CrossJunction, config.cross_junction.number_placements),
    ];
    let mut pieces = quotas
        .iter()
        .flat_map(|&(kind, count)| std::iter::repeat_n(kind, count as usize));
    let mut placed = 0;
    'slots: for row in ROWS_FOR_START..first_end_row {
        for col in 0..cols {
            let free = board
                .block(row, col)
                .is_some_and(|b| b.role == BlockRole::OffBoard && b.primary.is_none());
            if !free {
                continue;
            }
            let Some(kind) = pieces.next() else {
                break 'slots;
            };
            board.place(Placement::new(kind, row, col, 0, false));
            placed += 1;
        }
    }
    if placed < needed {
        return Err(LevelError::NotEnoughOffBoardSlots {
            needed,
            available: placed,
        });
    }

    for rock in &config.rock_placements {
        board.place(Placement::new(
            PieceKind::Rock,
            row0 + rock.row,
            col0 + rock.col,
            0,
            true,
        ));
    }

    for row in ROWS_FOR_START..first_end_row {
        for col in 0..cols {
            let kind = match board.role(row, col) {
                Some(BlockRole::OnBoard) => PieceKind::Dirt,
                _ => PieceKind::Rock,
            };
            board.place_filler(Placement::new(kind, row, col, 0, true));
        }
    }

    let ball_col = cols / 2;
    let ball = Ball::new(board.position(0, ball_col), 0, ball_col, tile / 4.0);
    log::info!(
        "movable passage: {}x{} grid, tile {:.3}, building area at ({}, {}), {} pieces, {} rocks",
        rows,
        cols,
        tile,
        row0,
        col0,
        needed,
        config.rock_placements.len()
    );
    Ok(Level::new(
        LevelVariant::Movable,
        board,
        ball,
        config.physics.clone(),
        viewport,
    ))
}

/// The fixed open floor the ball starts on, walled except for one gap at the top
fn add_starting_chute(board: &mut GameBoard, start_col: u32) {
    let last_col = board.cols() - 1;
    let top = ROWS_FOR_START - 1;
    for row in 0..ROWS_FOR_START {
        for col in 0..=last_col {
            let (kind, turns) = match (row, col) {
                (r, 0) if r == top && start_col == 0 => (PieceKind::ClosedBottom, 1),
                (r, c) if r == top && c == last_col && start_col == last_col => {
                    (PieceKind::ClosedBottom, 3)
                }
                (0, 0) => (PieceKind::ClosedCorner, 0),
                (0, c) if c == last_col => (PieceKind::ClosedCorner, 3),
                (0, _) => (PieceKind::ClosedBottom, 0),
                (r, 0) if r == top => (PieceKind::ClosedCorner, 1),
                (r, c) if r == top && c == last_col => (PieceKind::ClosedCorner, 2),
                (r, c) if r == top && c == start_col => (PieceKind::Open, 0),
                (r, _) if r == top => (PieceKind::ClosedBottom, 2),
                (_, 0) => (PieceKind::ClosedBottom, 1),
                (_, c) if c == last_col => (PieceKind::ClosedBottom, 3),
                _ => (PieceKind::Open, 0),
            };
            board.set_role(row, col, BlockRole::Begin);
            board.place(Placement::new(kind, row, col, turns, true));
        }
    }
}

/// A generated maze, seen as the closed walls of each cell
pub trait MazeLayout {
    fn rows(&self) -> u32;
    fn cols(&self) -> u32;
    fn start(&self) -> (u32, u32);
    fn end(&self) -> (u32, u32);
    /// Closed walls of a cell, board frame
    fn closed_walls(&self, row: u32, col: u32) -> WallSet;
}

/// Plain maze data, all walls closed until carved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMaze {
    rows: u32,
    cols: u32,
    start: (u32, u32),
    end: (u32, u32),
    cells: Vec<WallSet>,
}

impl GridMaze {
    pub fn new(rows: u32, cols: u32, start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            rows,
            cols,
            start,
            end,
            cells: vec![WallSet::ALL; (rows * cols) as usize],
        }
    }

    /// Open the wall between a cell and its neighbour. Returns false off the grid.
    pub fn carve(&mut self, row: u32, col: u32, wall: Wall) -> bool {
        let (dr, dc) = wall.step();
        let (Some(nr), Some(nc)) = (row.checked_add_signed(dr), col.checked_add_signed(dc)) else {
            return false;
        };
        if row >= self.rows || col >= self.cols || nr >= self.rows || nc >= self.cols {
            return false;
        }
        let here = (row * self.cols + col) as usize;
        let there = (nr * self.cols + nc) as usize;
        self.cells[here] = remove(self.cells[here], wall);
        self.cells[there] = remove(self.cells[there], wall.opposite());
        true
    }

    /// Carve a path visiting `cells` in order
    pub fn carve_path(&mut self, cells: &[(u32, u32)]) -> bool {
        cells.windows(2).all(|pair| {
            let ((r0, c0), (r1, c1)) = (pair[0], pair[1]);
            let wall = Wall::ALL
                .into_iter()
                .find(|w| {
                    let (dr, dc) = w.step();
                    r0.checked_add_signed(dr) == Some(r1) && c0.checked_add_signed(dc) == Some(c1)
                });
            wall.is_some_and(|w| self.carve(r0, c0, w))
        })
    }
}

fn remove(set: WallSet, wall: Wall) -> WallSet {
    set.iter()
        .filter(|w| *w != wall)
        .fold(WallSet::EMPTY, |acc, w| acc.with(w))
}

impl MazeLayout for GridMaze {
    fn rows(&self) -> u32 {
        self.rows
    }

    fn cols(&self) -> u32 {
        self.cols
    }

    fn start(&self) -> (u32, u32) {
        self.start
    }

    fn end(&self) -> (u32, u32) {
        self.end
    }

    fn closed_walls(&self, row: u32, col: u32) -> WallSet {
        self.cells
            .get((row * self.cols + col) as usize)
            .copied()
            .unwrap_or(WallSet::ALL)
    }
}

/// Build a rotatable passage level over a generated maze
///
/// Each cell becomes the tunnel piece matching its open walls, turned to a
/// random rotation. The starting piece keeps its true rotation and is fixed.
pub fn build_rotatable<M: MazeLayout>(
    config: &RotatablePassageConfig,
    viewport: Viewport,
    maze: &M,
) -> Result<Level, LevelError> {
    config.validate()?;
    let (rows, cols) = (maze.rows(), maze.cols());
    if rows == 0 || cols == 0 {
        return Err(LevelError::EmptyMaze);
    }
    for (row, col) in [maze.start(), maze.end()] {
        if row >= rows || col >= cols {
            return Err(LevelError::MazeCellOutOfRange { row, col });
        }
    }
    if rows != config.number_rows {
        log::debug!(
            "maze has {} rows, level asked for {}",
            rows,
            config.number_rows
        );
    }

    let tile = (viewport.height / rows as f32).min(viewport.width / cols as f32);
    let mut board = GameBoard::new(rows, cols, tile, Vec3::new(0.0, 0.0, viewport.floor_z), 0)?;
    let mut rng = Pcg32::seed_from_u64(config.physics.seed);
    let start = maze.start();

    for row in 0..rows {
        for col in 0..cols {
            let closed = maze.closed_walls(row, col);
            let (kind, fitted) =
                PieceKind::fit(closed).ok_or(LevelError::UnsupportedCell { row, col })?;
            let is_start = (row, col) == start;
            let turns = if is_start {
                fitted
            } else {
                rng.random_range(0..4u8)
            };
            board.set_role(row, col, BlockRole::OnBoard);
            board.place(Placement::new(kind, row, col, turns, is_start));
        }
    }
    let (end_row, end_col) = maze.end();
    board.set_goal(end_row, end_col);

    let ball = Ball::new(board.position(start.0, start.1), start.0, start.1, tile / 4.0);
    log::info!(
        "rotatable passage: {}x{} maze, start {:?}, end {:?}",
        rows,
        cols,
        start,
        maze.end()
    );
    Ok(Level::new(
        LevelVariant::Rotatable,
        board,
        ball,
        config.physics.clone(),
        viewport,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PieceConfig, RockPlacement};

    fn viewport() -> Viewport {
        Viewport::new(9.0, 16.0).unwrap()
    }

    #[test]
    fn test_movable_layout_roles() {
        let config = MovablePassageConfig::default();
        let level = build_movable(&config, viewport()).unwrap();
        let board = &level.board;

        let begin = board.blocks().filter(|(_, _, b)| b.role == BlockRole::Begin).count();
        assert_eq!(begin as u32, ROWS_FOR_START * board.cols());
        let ends: Vec<_> = board
            .blocks()
            .filter(|(_, _, b)| b.role == BlockRole::End)
            .map(|(r, c, _)| (r, c))
            .collect();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].0, board.rows() - ROWS_FOR_END);
        let on_board_pieces = board
            .blocks()
            .filter(|(_, _, b)| b.role == BlockRole::OnBoard)
            .count() as u32;
        assert!(on_board_pieces >= config.number_tiles_x * config.number_tiles_y);
    }

    #[test]
    fn test_movable_places_every_piece_off_board() {
        let config = MovablePassageConfig::default();
        let level = build_movable(&config, viewport()).unwrap();
        let board = &level.board;
        for (kind, quota) in [
            (PieceKind::Straight, config.straight.number_placements),
            (PieceKind::Turn, config.turn.number_placements),
            (PieceKind::TJunction, config.t_junction.number_placements),
            (PieceKind::CrossJunction, config.cross_junction.number_placements),
        ] {
            let staged = board
                .catalog
                .iter()
                .filter(|(_, p)| p.kind == kind && !p.fixed)
                .inspect(|(_, p)| {
                    assert_eq!(board.role(p.row, p.col), Some(BlockRole::OffBoard));
                })
                .count();
            assert_eq!(staged as u32, quota, "{}", kind.name());
        }
    }

    #[test]
    fn test_movable_fillers_everywhere_between_chute_and_end() {
        let level = build_movable(&MovablePassageConfig::default(), viewport()).unwrap();
        let board = &level.board;
        for (row, col, block) in board.blocks() {
            if row < ROWS_FOR_START || row >= board.rows() - ROWS_FOR_END {
                continue;
            }
            let has_filler = [block.primary, block.secondary]
                .into_iter()
                .flatten()
                .any(|id| board.catalog[id].kind.is_filler());
            assert!(has_filler, "({row}, {col}) has no filler");
        }
    }

    #[test]
    fn test_chute_opens_at_start_column() {
        let config = MovablePassageConfig {
            start_column: 2,
            ..MovablePassageConfig::default()
        };
        let level = build_movable(&config, viewport()).unwrap();
        let board = &level.board;
        let top = ROWS_FOR_START - 1;
        let gaps: Vec<u32> = (0..board.cols())
            .filter(|&c| {
                let id = board.primary_at(top, c).unwrap();
                !board.catalog[id].has_wall_at(Wall::Up)
            })
            .collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(board.role(ROWS_FOR_START, gaps[0]), Some(BlockRole::OnBoard));

        // Every chute border is walled on its outside
        for col in 0..board.cols() {
            let id = board.primary_at(0, col).unwrap();
            assert!(board.catalog[id].has_wall_at(Wall::Down));
        }
        for row in 0..ROWS_FOR_START {
            let left = board.primary_at(row, 0).unwrap();
            let right = board.primary_at(row, board.cols() - 1).unwrap();
            assert!(board.catalog[left].has_wall_at(Wall::Left));
            assert!(board.catalog[right].has_wall_at(Wall::Right));
        }
    }

    #[test]
    fn test_ball_starts_in_chute() {
        let level = build_movable(&MovablePassageConfig::default(), viewport()).unwrap();
        assert_eq!(level.ball.row, 0);
        assert_eq!(level.ball.col, level.board.cols() / 2);
        assert_eq!(level.ball.radius, level.board.block_size() / 4.0);
        assert!(!level.is_finished());
    }

    #[test]
    fn test_board_anchored_to_top() {
        let vp = viewport();
        let level = build_movable(&MovablePassageConfig::default(), vp).unwrap();
        let top = level.board.center().y + level.board.height() / 2.0;
        assert!((top - vp.height / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_crowded_screen_shrinks_tiles() {
        let config = MovablePassageConfig {
            number_tiles_x: 4,
            number_tiles_y: 4,
            start_column: 0,
            end_column: 3,
            straight: PieceConfig::with_count(30),
            ..MovablePassageConfig::default()
        };
        let vp = Viewport::new(4.0, 9.0).unwrap();
        let level = build_movable(&config, vp).unwrap();
        assert!(level.board.block_size() < 1.0);
        let staged = level.board.catalog.iter().filter(|(_, p)| !p.fixed).count();
        assert_eq!(staged as u32, config.playable_pieces());
    }

    #[test]
    fn test_rocks_sit_on_building_area() {
        let config = MovablePassageConfig {
            rock_placements: vec![RockPlacement { row: 0, col: 1 }],
            ..MovablePassageConfig::default()
        };
        let level = build_movable(&config, viewport()).unwrap();
        let board = &level.board;
        let rocks: Vec<_> = board
            .blocks()
            .filter(|(_, _, b)| {
                b.role == BlockRole::OnBoard
                    && b.primary.is_some_and(|id| board.catalog[id].kind == PieceKind::Rock)
            })
            .collect();
        assert_eq!(rocks.len(), 1);
        assert!(rocks[0].2.secondary.is_some());
    }

    #[test]
    fn test_invalid_config_fails() {
        let config = MovablePassageConfig {
            number_tiles_x: 0,
            ..MovablePassageConfig::default()
        };
        assert!(build_movable(&config, viewport()).is_err());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let config = MovablePassageConfig {
            number_tiles_x: 60_000,
            number_tiles_y: 60_000,
            ..MovablePassageConfig::default()
        };
        assert!(matches!(
            build_movable(&config, viewport()),
            Err(LevelError::InvalidDimensions { .. })
        ));
    }

    fn snake() -> GridMaze {
        let mut maze = GridMaze::new(3, 3, (0, 0), (2, 2));
        assert!(maze.carve_path(&[
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 2),
            (1, 1),
            (1, 0),
            (2, 0),
            (2, 1),
            (2, 2),
        ]));
        maze
    }

    #[test]
    fn test_grid_maze_carving() {
        let maze = snake();
        assert_eq!(maze.closed_walls(0, 0), WallSet::of(&[Wall::Left, Wall::Up, Wall::Down]));
        assert_eq!(maze.closed_walls(0, 1), WallSet::of(&[Wall::Up, Wall::Down]));
        let mut maze = maze;
        assert!(!maze.carve(0, 0, Wall::Down));
    }

    #[test]
    fn test_rotatable_start_fixed_and_fitted() {
        let maze = snake();
        let level = build_rotatable(&RotatablePassageConfig::default(), viewport(), &maze).unwrap();
        let board = &level.board;
        let start = board.catalog[board.primary_at(0, 0).unwrap()].clone();
        assert!(start.fixed);
        assert_eq!(start.kind, PieceKind::DeadEnd);
        assert_eq!(start.closed_walls(), maze.closed_walls(0, 0));
        assert!(board.is_goal(2, 2));
        assert_eq!((level.ball.row, level.ball.col), (0, 0));
        for (row, col, _) in board.blocks() {
            let p = &board.catalog[board.primary_at(row, col).unwrap()];
            // Same piece as the maze cell, possibly turned
            assert_eq!(p.kind, PieceKind::fit(maze.closed_walls(row, col)).unwrap().0);
        }
    }

    #[test]
    fn test_rotatable_seed_is_deterministic() {
        let maze = snake();
        let config = RotatablePassageConfig::default();
        let a = build_rotatable(&config, viewport(), &maze).unwrap();
        let b = build_rotatable(&config, viewport(), &maze).unwrap();
        let turns = |l: &Level| {
            l.board
                .catalog
                .iter()
                .map(|(_, p)| p.quarter_turns)
                .collect::<Vec<_>>()
        };
        assert_eq!(turns(&a), turns(&b));
    }

    #[test]
    fn test_rotatable_rejects_closed_cell() {
        let maze = GridMaze::new(2, 2, (0, 0), (1, 1));
        assert!(matches!(
            build_rotatable(&RotatablePassageConfig::default(), viewport(), &maze),
            Err(LevelError::UnsupportedCell { row: 0, col: 0 })
        ));
    }
}
