//! Placements and the arena that owns them
//!
//! Placements are created during construction and never removed, so a
//! `PlacementId` stays valid for the level's lifetime.

use std::ops::{Index, IndexMut};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::piece::{ObjRef, PieceKind, TextureVariant};
use super::wall::{Wall, WallSet};

/// Stable index of a placement in its [`Catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlacementId(pub usize);

/// One sited, rotated piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: PieceKind,
    pub row: u32,
    pub col: u32,
    /// Clockwise quarter turns, always 0..4
    pub quarter_turns: u8,
    /// Structural pieces that can never be moved or turned
    pub fixed: bool,
    /// The piece the ball came from
    pub prev: Option<PlacementId>,
    /// The piece the ball went on to
    pub next: Option<PlacementId>,
    /// Accumulated drag offset while the piece is being moved
    pub move_progress: Option<Vec2>,
    #[serde(skip)]
    pub render_ref: Option<ObjRef>,
}

impl Placement {
    pub fn new(kind: PieceKind, row: u32, col: u32, quarter_turns: u8, fixed: bool) -> Self {
        Self {
            kind,
            row,
            col,
            quarter_turns: quarter_turns % 4,
            fixed,
            prev: None,
            next: None,
            move_progress: None,
            render_ref: None,
        }
    }

    /// Fixed pieces and pieces on the ball's path cannot be touched
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.fixed || self.prev.is_some() || self.next.is_some()
    }

    /// Rotation in degrees, a multiple of 90
    pub fn rotation_degrees(&self) -> f32 {
        self.quarter_turns as f32 * 90.0
    }

    /// Rotation about +z in radians (clockwise turns are negative)
    pub fn rotation_angle(&self) -> f32 {
        -(self.quarter_turns as f32) * std::f32::consts::FRAC_PI_2
    }

    pub fn rotate_quarter(&mut self) {
        self.quarter_turns = (self.quarter_turns + 1) % 4;
    }

    #[inline]
    pub fn has_wall_at(&self, wall: Wall) -> bool {
        self.kind.has_wall_at(wall, self.quarter_turns)
    }

    /// Closed walls in the board frame
    pub fn closed_walls(&self) -> WallSet {
        self.kind.closed_walls_rotated(self.quarter_turns)
    }

    pub fn texture_variant(&self) -> TextureVariant {
        if self.kind.is_filler() {
            TextureVariant::Filler
        } else if self.is_locked() {
            TextureVariant::Locked
        } else {
            TextureVariant::Movable
        }
    }

    /// Drop the render handle if it no longer matches the lock state
    pub fn refresh_render_ref(&mut self) {
        if self
            .render_ref
            .is_some_and(|r| r.variant != self.texture_variant())
        {
            self.render_ref = None;
        }
    }
}

/// Arena of every placement in a level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    placements: Vec<Placement>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, placement: Placement) -> PlacementId {
        self.placements.push(placement);
        PlacementId(self.placements.len() - 1)
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.placements.get(id.0)
    }

    pub fn get_mut(&mut self, id: PlacementId) -> Option<&mut Placement> {
        self.placements.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlacementId, &Placement)> {
        self.placements
            .iter()
            .enumerate()
            .map(|(i, p)| (PlacementId(i), p))
    }

    pub fn ids(&self) -> impl Iterator<Item = PlacementId> + use<> {
        (0..self.placements.len()).map(PlacementId)
    }

    pub fn count_kind(&self, kind: PieceKind) -> usize {
        self.placements.iter().filter(|p| p.kind == kind).count()
    }

    /// The placement currently mid-drag, if any
    pub fn moving(&self) -> Option<PlacementId> {
        self.iter()
            .find(|(_, p)| p.move_progress.is_some())
            .map(|(id, _)| id)
    }
}

impl Index<PlacementId> for Catalog {
    type Output = Placement;

    fn index(&self, id: PlacementId) -> &Placement {
        &self.placements[id.0]
    }
}

impl IndexMut<PlacementId> for Catalog {
    fn index_mut(&mut self, id: PlacementId) -> &mut Placement {
        &mut self.placements[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_state_follows_links() {
        let mut catalog = Catalog::new();
        let a = catalog.add(Placement::new(PieceKind::Straight, 3, 1, 0, false));
        let b = catalog.add(Placement::new(PieceKind::Turn, 4, 1, 0, false));
        assert!(!catalog[a].is_locked());
        assert_eq!(catalog[a].texture_variant(), TextureVariant::Movable);

        catalog[b].prev = Some(a);
        assert!(catalog[b].is_locked());
        assert_eq!(catalog[b].texture_variant(), TextureVariant::Locked);
        assert!(!catalog[a].is_locked());
    }

    #[test]
    fn test_fillers_are_never_movable_skins() {
        let rock = Placement::new(PieceKind::Rock, 0, 0, 0, true);
        assert_eq!(rock.texture_variant(), TextureVariant::Filler);
        let dirt = Placement::new(PieceKind::Dirt, 0, 0, 0, false);
        assert_eq!(dirt.texture_variant(), TextureVariant::Filler);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut p = Placement::new(PieceKind::Straight, 0, 0, 3, false);
        assert_eq!(p.rotation_degrees(), 270.0);
        p.rotate_quarter();
        assert_eq!(p.quarter_turns, 0);
        assert!(p.has_wall_at(Wall::Left));
    }

    #[test]
    fn test_render_ref_cleared_on_variant_change() {
        let mut p = Placement::new(PieceKind::Straight, 0, 0, 0, false);
        p.render_ref = Some(ObjRef {
            variant: TextureVariant::Movable,
            texture: 3,
        });
        p.refresh_render_ref();
        assert!(p.render_ref.is_some());
        p.next = Some(PlacementId(7));
        p.refresh_render_ref();
        assert!(p.render_ref.is_none());
    }
}
