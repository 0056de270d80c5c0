//! Draw list building
//!
//! Turns the level into model transforms tagged with the skin each object
//! is drawn with. Skins are chosen lazily and cached on the placement until
//! its lock state changes.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::instance::{DrawInstance, DrawKind};
use super::textures::{TextureDescription, TextureTable};
use crate::config::{MovablePassageConfig, PieceConfig, RotatablePassageConfig};
use crate::consts::*;
use crate::sim::{BlockRole, Level, LevelVariant, ObjRef, PieceKind, PlacementId, TextureVariant};

/// Height of the placeholder label drawn for unskinned pieces
const LABEL_HEIGHT_PX: u32 = 64;

/// Configured skins, as texture table indices
#[derive(Debug, Clone, Default)]
struct SkinBook {
    pieces: HashMap<(PieceKind, TextureVariant), Vec<u32>>,
    finish: Vec<u32>,
    border: Vec<u32>,
}

fn intern_paths(table: &mut TextureTable, paths: &[String]) -> Vec<u32> {
    paths
        .iter()
        .map(|p| table.intern(TextureDescription::Path(p.clone())))
        .collect()
}

impl SkinBook {
    fn add_piece(&mut self, table: &mut TextureTable, kind: PieceKind, config: &PieceConfig) {
        let movable = intern_paths(table, &config.textures);
        let locked = if config.locked_textures.is_empty() {
            movable.clone()
        } else {
            intern_paths(table, &config.locked_textures)
        };
        self.pieces.insert((kind, TextureVariant::Movable), movable);
        self.pieces.insert((kind, TextureVariant::Locked), locked);
    }

    fn add(&mut self, table: &mut TextureTable, kind: PieceKind, variant: TextureVariant, paths: &[String]) {
        self.pieces.insert((kind, variant), intern_paths(table, paths));
    }

    fn movable(config: &MovablePassageConfig, table: &mut TextureTable) -> Self {
        let mut book = Self::default();
        book.add_piece(table, PieceKind::Straight, &config.straight);
        book.add_piece(table, PieceKind::Turn, &config.turn);
        book.add_piece(table, PieceKind::TJunction, &config.t_junction);
        book.add_piece(table, PieceKind::CrossJunction, &config.cross_junction);

        let skins = &config.textures;
        book.add(table, PieceKind::Dirt, TextureVariant::Filler, &skins.dirt);
        book.add(table, PieceKind::Rock, TextureVariant::Filler, &skins.rock);
        book.add(table, PieceKind::Open, TextureVariant::Locked, &skins.beginning_open);
        book.add(table, PieceKind::ClosedBottom, TextureVariant::Locked, &skins.beginning_side);
        book.add(table, PieceKind::ClosedCorner, TextureVariant::Locked, &skins.beginning_corner);
        book.finish = intern_paths(table, &skins.end);
        book
    }

    fn rotatable(config: &RotatablePassageConfig, table: &mut TextureTable) -> Self {
        let mut book = Self::default();
        book.add_piece(table, PieceKind::Straight, &config.straight);
        book.add_piece(table, PieceKind::Turn, &config.turn);
        book.add_piece(table, PieceKind::TJunction, &config.t_junction);
        book.add_piece(table, PieceKind::CrossJunction, &config.cross_junction);
        book.add_piece(table, PieceKind::DeadEnd, &config.dead_end);
        book.border = intern_paths(table, &config.border_textures);
        book.finish = intern_paths(table, config.hole_texture.as_slice());
        book
    }
}

/// Everything the backend needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub instances: Vec<DrawInstance>,
    pub ball: Mat4,
    /// Bumped whenever new textures were added to the table
    pub textures_generation: u64,
}

/// Builds draw lists for a level, owning its texture table
#[derive(Debug, Clone)]
pub struct DrawBuilder {
    textures: TextureTable,
    skins: SkinBook,
    rng: Pcg32,
}

impl DrawBuilder {
    pub fn for_movable(config: &MovablePassageConfig) -> Self {
        let mut textures = TextureTable::new();
        let skins = SkinBook::movable(config, &mut textures);
        Self {
            textures,
            skins,
            rng: Pcg32::seed_from_u64(config.physics.seed),
        }
    }

    pub fn for_rotatable(config: &RotatablePassageConfig) -> Self {
        let mut textures = TextureTable::new();
        let skins = SkinBook::rotatable(config, &mut textures);
        Self {
            textures,
            skins,
            rng: Pcg32::seed_from_u64(config.physics.seed),
        }
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    /// Pick one of the configured skins, or a generated label when none is set
    fn pick(&mut self, kind: PieceKind, variant: TextureVariant) -> u32 {
        let choice = match self.skins.pieces.get(&(kind, variant)) {
            Some(choices) if !choices.is_empty() => {
                Some(choices[self.rng.random_range(0..choices.len())])
            }
            _ => None,
        };
        choice.unwrap_or_else(|| {
            self.textures.intern(TextureDescription::GeneratedText {
                text: kind.name().to_string(),
                height_px: LABEL_HEIGHT_PX,
            })
        })
    }

    /// Skin for scenery, fixed per cell so it does not flicker between frames
    fn scenery(&mut self, choices: &[u32], cell: usize) -> u32 {
        if choices.is_empty() {
            self.textures.intern(TextureDescription::Dummy)
        } else {
            choices[cell % choices.len()]
        }
    }

    fn placement_instance(
        &mut self,
        level: &mut Level,
        id: PlacementId,
        at: Vec3,
        scale: f32,
    ) -> DrawInstance {
        let placement = &level.board.catalog[id];
        let (kind, variant, angle) = (
            placement.kind,
            placement.texture_variant(),
            placement.rotation_angle(),
        );
        let cached = placement.render_ref;
        let obj = match cached {
            Some(obj) if obj.variant == variant => obj,
            _ => {
                let obj = ObjRef {
                    variant,
                    texture: self.pick(kind, variant),
                };
                level.board.catalog[id].render_ref = Some(obj);
                obj
            }
        };
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            Quat::from_rotation_z(angle),
            at,
        );
        DrawInstance::new(model, obj.variant, DrawKind::Piece(kind), obj.texture)
    }

    /// Build this frame's draw list
    pub fn build(&mut self, level: &mut Level) -> DrawList {
        let bs = level.board.block_size();
        let scale = bs / MODEL_SIZE;
        let floor_z = level.board.center().z;
        let moving_z = floor_z + level.ball.scale();
        let off_board_z = floor_z + bs * (OFF_BOARD_SCALE + 0.5);

        let cells: Vec<_> = level
            .board
            .blocks()
            .map(|(row, col, b)| (row, col, b.role, b.primary, b.secondary))
            .collect();
        let mut instances = Vec::with_capacity(cells.len() * 2);

        for (row, col, role, primary, secondary) in cells {
            let pos = level.board.position(row, col);
            if level.board.is_goal(row, col) {
                let finish = self.skins.finish.clone();
                let texture = self.scenery(&finish, (row + col) as usize);
                let model = Mat4::from_scale_rotation_translation(Vec3::splat(scale), Quat::IDENTITY, pos);
                instances.push(DrawInstance::new(
                    model,
                    TextureVariant::Locked,
                    DrawKind::Finish,
                    texture,
                ));
            }
            let Some(primary) = primary else {
                continue;
            };
            let placement = &level.board.catalog[primary];
            let progress = placement.move_progress;
            let staged = role == BlockRole::OffBoard && !placement.kind.is_filler();

            // The filler shows under staged and moving pieces
            if let Some(filler) = secondary.filter(|_| progress.is_some() || staged) {
                instances.push(self.placement_instance(level, filler, pos, scale));
            }
            let (at, piece_scale) = match progress {
                Some(p) => (p.extend(moving_z), scale),
                None if staged => (pos.truncate().extend(off_board_z), scale * OFF_BOARD_SCALE),
                None => (pos, scale),
            };
            instances.push(self.placement_instance(level, primary, at, piece_scale));
        }

        if level.variant == LevelVariant::Rotatable {
            self.push_border(level, &mut instances);
        }

        DrawList {
            instances,
            ball: level.ball.transform(),
            textures_generation: self.textures.generation(),
        }
    }

    /// One ring of frame tiles around the maze
    fn push_border(&mut self, level: &Level, instances: &mut Vec<DrawInstance>) {
        let board = &level.board;
        let bs = board.block_size();
        let (rows, cols) = (board.rows() as i32, board.cols() as i32);
        let origin = board.center().truncate() - Vec2::new(board.width(), board.height()) / 2.0;
        let z = board.center().z - bs / 2.0;
        let border = self.skins.border.clone();
        for row in -1..=rows {
            for col in -1..=cols {
                if (0..rows).contains(&row) && (0..cols).contains(&col) {
                    continue;
                }
                let xy = origin + bs * Vec2::new(col as f32 + 0.5, row as f32 + 0.5);
                let model = Mat4::from_scale_rotation_translation(
                    Vec3::splat(bs / MODEL_SIZE),
                    Quat::IDENTITY,
                    xy.extend(z),
                );
                let texture = self.scenery(&border, (row + col).unsigned_abs() as usize);
                instances.push(DrawInstance::new(
                    model,
                    TextureVariant::Filler,
                    DrawKind::Border,
                    texture,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FillerTextures;
    use crate::sim::{GridMaze, Viewport, build_movable, build_rotatable};

    fn skinned_config() -> MovablePassageConfig {
        let mut config = MovablePassageConfig::default();
        config.straight.textures = vec!["straight_a.png".into(), "straight_b.png".into()];
        config.straight.locked_textures = vec!["straight_locked.png".into()];
        config.textures = FillerTextures {
            dirt: vec!["dirt.png".into()],
            rock: vec!["rock.png".into()],
            end: vec!["end.png".into()],
            ..FillerTextures::default()
        };
        config
    }

    fn movable_level(config: &MovablePassageConfig) -> Level {
        build_movable(config, Viewport::new(9.0, 16.0).unwrap()).unwrap()
    }

    fn first_staged(level: &Level) -> PlacementId {
        level
            .board
            .catalog
            .iter()
            .find(|(_, p)| !p.fixed)
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn test_every_piece_gets_drawn() {
        let config = skinned_config();
        let mut level = movable_level(&config);
        let mut builder = DrawBuilder::for_movable(&config);
        let list = builder.build(&mut level);

        let primaries = level.board.blocks().filter(|(_, _, b)| b.primary.is_some()).count();
        // Only fillers hidden under a piece go without a skin
        let skinned = level.board.catalog.iter().all(|(id, p)| {
            p.render_ref.is_some() || level.board.secondary_at(p.row, p.col) == Some(id)
        });
        assert!(skinned);
        assert!(list.instances.len() > primaries);
        let finishes = list
            .instances
            .iter()
            .filter(|i| i.kind == DrawKind::Finish.code())
            .count();
        assert_eq!(finishes, 1);
        assert_eq!(list.ball, level.ball.transform());
    }

    #[test]
    fn test_skins_are_stable_between_frames() {
        let config = skinned_config();
        let mut level = movable_level(&config);
        let mut builder = DrawBuilder::for_movable(&config);
        let first = builder.build(&mut level);
        let second = builder.build(&mut level);
        assert_eq!(first, second);
    }

    #[test]
    fn test_generation_grows_with_generated_labels() {
        let config = skinned_config();
        let mut builder = DrawBuilder::for_movable(&config);
        let before = builder.textures().generation();
        let mut level = movable_level(&config);
        let list = builder.build(&mut level);
        // Turn and junction pieces have no skins and get generated labels
        assert!(list.textures_generation > before);
        assert!(builder.textures().iter().any(|t| matches!(
            t,
            TextureDescription::GeneratedText { text, .. } if text == "turn"
        )));
    }

    #[test]
    fn test_staged_pieces_are_small_and_raised() {
        let config = skinned_config();
        let mut level = movable_level(&config);
        let mut builder = DrawBuilder::for_movable(&config);
        let list = builder.build(&mut level);

        let id = first_staged(&level);
        let p = &level.board.catalog[id];
        let pos = level.board.position(p.row, p.col);
        let bs = level.board.block_size();
        let raised = level.board.center().z + bs * (OFF_BOARD_SCALE + 0.5);
        let inst = list
            .instances
            .iter()
            .find(|i| {
                let t = i.model().w_axis.truncate();
                (t.truncate() - pos.truncate()).length() < 1e-4 && (t.z - raised).abs() < 1e-4
            })
            .unwrap();
        let scale = inst.model().x_axis.truncate().length();
        assert!((scale - bs / MODEL_SIZE * OFF_BOARD_SCALE).abs() < 1e-4);
    }

    #[test]
    fn test_locking_switches_skin_variant() {
        let config = skinned_config();
        let mut level = movable_level(&config);
        let mut builder = DrawBuilder::for_movable(&config);
        builder.build(&mut level);
        let id = first_staged(&level);
        assert_eq!(
            level.board.catalog[id].render_ref.map(|r| r.variant),
            Some(TextureVariant::Movable)
        );

        let other = level
            .board
            .catalog
            .iter()
            .find(|(other, p)| *other != id && !p.fixed)
            .map(|(other, _)| other)
            .unwrap();
        level.board.catalog.link_transition(other, id);
        assert_eq!(level.board.catalog[id].render_ref, None);
        builder.build(&mut level);
        let obj = level.board.catalog[id].render_ref.unwrap();
        assert_eq!(obj.variant, TextureVariant::Locked);
        assert_eq!(
            builder.textures().get(obj.texture),
            Some(&TextureDescription::Path("straight_locked.png".into()))
        );
    }

    #[test]
    fn test_dragged_piece_follows_pointer() {
        let config = skinned_config();
        let mut level = movable_level(&config);
        let mut builder = DrawBuilder::for_movable(&config);
        let id = first_staged(&level);
        let (row, col) = (level.board.catalog[id].row, level.board.catalog[id].col);
        let start = level.board.position(row, col).truncate();
        assert!(level.drag(start, Vec2::new(0.5, 0.25)));

        let list = builder.build(&mut level);
        let moving_z = level.board.center().z + level.ball.scale();
        let target = (start + Vec2::new(0.5, 0.25)).extend(moving_z);
        assert!(list
            .instances
            .iter()
            .any(|i| (i.model().w_axis.truncate() - target).length() < 1e-4));
        // The filler under the lifted piece is drawn at the cell itself
        let filler = level.board.secondary_at(row, col).unwrap();
        assert!(level.board.catalog[filler].render_ref.is_some());
    }

    #[test]
    fn test_rotatable_border_ring() {
        let mut maze = GridMaze::new(3, 2, (0, 0), (2, 1));
        assert!(maze.carve_path(&[(0, 0), (1, 0), (2, 0), (2, 1)]));
        assert!(maze.carve_path(&[(0, 0), (0, 1), (1, 1)]));
        let config = RotatablePassageConfig {
            border_textures: vec!["border.png".into()],
            hole_texture: Some("hole.png".into()),
            ..RotatablePassageConfig::default()
        };
        let mut level = build_rotatable(&config, Viewport::new(4.0, 6.0).unwrap(), &maze).unwrap();
        let mut builder = DrawBuilder::for_rotatable(&config);
        let list = builder.build(&mut level);
        let border = list
            .instances
            .iter()
            .filter(|i| i.kind == DrawKind::Border.code())
            .count();
        assert_eq!(border, 2 * (3 + 2) + 4);
        let hole = list
            .instances
            .iter()
            .find(|i| i.kind == DrawKind::Finish.code())
            .unwrap();
        assert_eq!(
            builder.textures().get(hole.texture),
            Some(&TextureDescription::Path("hole.png".into()))
        );
    }
}
