//! Piece kinds and their wall masks

use serde::{Deserialize, Serialize};

use super::wall::{Wall, WallSet};

/// The fixed catalog of passage pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    /// Tunnel running up and down
    Straight,
    /// Tunnel bending from the bottom to the left
    Turn,
    /// Open left, right and bottom
    TJunction,
    /// Open on every side
    CrossJunction,
    /// Open at the bottom only
    DeadEnd,
    /// Open floor of the starting chute
    Open,
    /// Chute floor along the border
    ClosedBottom,
    /// Chute floor in a corner
    ClosedCorner,
    /// On-board filler
    Dirt,
    /// Off-board filler and on-board obstacle
    Rock,
}

impl PieceKind {
    /// Pieces a player can move or turn
    pub const PLAYABLE: [PieceKind; 5] = [
        PieceKind::Straight,
        PieceKind::Turn,
        PieceKind::TJunction,
        PieceKind::CrossJunction,
        PieceKind::DeadEnd,
    ];

    /// Walls that are closed at rotation 0
    pub fn closed_walls(self) -> WallSet {
        use Wall::*;
        match self {
            PieceKind::Straight => WallSet::of(&[Left, Right]),
            PieceKind::Turn => WallSet::of(&[Right, Up]),
            PieceKind::TJunction => WallSet::of(&[Up]),
            PieceKind::CrossJunction | PieceKind::Open => WallSet::EMPTY,
            PieceKind::DeadEnd => WallSet::of(&[Left, Right, Up]),
            PieceKind::ClosedBottom => WallSet::of(&[Down]),
            PieceKind::ClosedCorner => WallSet::of(&[Down, Left]),
            PieceKind::Dirt | PieceKind::Rock => WallSet::ALL,
        }
    }

    /// Closed walls in the board frame after `quarter_turns` clockwise turns
    pub fn closed_walls_rotated(self, quarter_turns: u8) -> WallSet {
        self.closed_walls().rotated(quarter_turns)
    }

    /// Whether `wall` (board frame) is closed for a piece turned by `quarter_turns`
    #[inline]
    pub fn has_wall_at(self, wall: Wall, quarter_turns: u8) -> bool {
        self.closed_walls().contains(wall.unrotated(quarter_turns))
    }

    /// Dirt and rock keep slots occupied and never move
    pub fn is_filler(self) -> bool {
        matches!(self, PieceKind::Dirt | PieceKind::Rock)
    }

    /// The starting chute is an open floor rather than a tunnel
    pub fn is_open_area(self) -> bool {
        matches!(
            self,
            PieceKind::Open | PieceKind::ClosedBottom | PieceKind::ClosedCorner
        )
    }

    /// Find the tunnel piece and rotation whose closed walls match exactly
    pub fn fit(closed: WallSet) -> Option<(PieceKind, u8)> {
        Self::PLAYABLE.iter().find_map(|&kind| {
            (0..4u8)
                .find(|&turns| kind.closed_walls_rotated(turns) == closed)
                .map(|turns| (kind, turns))
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Straight => "straight",
            PieceKind::Turn => "turn",
            PieceKind::TJunction => "t-junction",
            PieceKind::CrossJunction => "cross-junction",
            PieceKind::DeadEnd => "dead-end",
            PieceKind::Open => "open",
            PieceKind::ClosedBottom => "closed-bottom",
            PieceKind::ClosedCorner => "closed-corner",
            PieceKind::Dirt => "dirt",
            PieceKind::Rock => "rock",
        }
    }
}

/// Which skin a placement is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureVariant {
    Movable,
    Locked,
    Filler,
}

/// Opaque handle into the renderer's texture table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjRef {
    pub variant: TextureVariant,
    pub texture: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [PieceKind; 10] = [
        PieceKind::Straight,
        PieceKind::Turn,
        PieceKind::TJunction,
        PieceKind::CrossJunction,
        PieceKind::DeadEnd,
        PieceKind::Open,
        PieceKind::ClosedBottom,
        PieceKind::ClosedCorner,
        PieceKind::Dirt,
        PieceKind::Rock,
    ];

    #[test]
    fn test_rotation_symmetry() {
        for kind in ALL_KINDS {
            for wall in Wall::ALL {
                for turns in 0..4 {
                    assert_eq!(
                        kind.has_wall_at(wall, turns),
                        kind.has_wall_at(wall, turns + 4),
                        "{} {:?} {}",
                        kind.name(),
                        wall,
                        turns
                    );
                }
            }
            assert_eq!(kind.closed_walls_rotated(4), kind.closed_walls());
        }
    }

    #[test]
    fn test_half_turn_swaps_opposites() {
        for kind in ALL_KINDS {
            for wall in Wall::ALL {
                assert_eq!(kind.has_wall_at(wall, 2), kind.has_wall_at(wall.opposite(), 0));
            }
        }
    }

    #[test]
    fn test_straight_turns_sideways() {
        assert!(PieceKind::Straight.has_wall_at(Wall::Left, 0));
        assert!(!PieceKind::Straight.has_wall_at(Wall::Up, 0));
        assert!(PieceKind::Straight.has_wall_at(Wall::Up, 1));
        assert!(PieceKind::Straight.has_wall_at(Wall::Down, 1));
        assert!(!PieceKind::Straight.has_wall_at(Wall::Left, 1));
    }

    #[test]
    fn test_turn_rotation() {
        // Rotation 0 opens Left and Down
        assert!(!PieceKind::Turn.has_wall_at(Wall::Left, 0));
        assert!(!PieceKind::Turn.has_wall_at(Wall::Down, 0));
        // A quarter turn moves the Left opening to Up
        assert!(!PieceKind::Turn.has_wall_at(Wall::Up, 1));
        assert!(!PieceKind::Turn.has_wall_at(Wall::Left, 1));
        assert!(PieceKind::Turn.has_wall_at(Wall::Down, 1));
    }

    #[test]
    fn test_fit_recovers_rotation() {
        for kind in PieceKind::PLAYABLE {
            for turns in 0..4 {
                let closed = kind.closed_walls_rotated(turns);
                let (fitted, fitted_turns) = PieceKind::fit(closed).unwrap();
                assert_eq!(fitted, kind);
                assert_eq!(fitted.closed_walls_rotated(fitted_turns), closed);
            }
        }
        assert_eq!(PieceKind::fit(WallSet::ALL), None);
    }
}
