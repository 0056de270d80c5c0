//! Level configuration
//!
//! Level files are JSON with PascalCase keys. Every field has a default so a
//! partial file still loads.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::LevelError;

/// Ball physics tuning shared by every passage level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PhysicsConfig {
    /// Reflect the ball off closed walls instead of stopping it
    pub bounce_enabled: bool,
    pub drag_constant: f32,
    /// Scales the device tilt into an acceleration
    pub acceleration_adjustment: f32,
    /// Seed for texture choice and random rotations
    pub seed: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            bounce_enabled: false,
            drag_constant: DRAG_CONSTANT,
            acceleration_adjustment: ACCELERATION_ADJUSTMENT,
            seed: 0,
        }
    }
}

/// Quota and skins for one playable piece kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PieceConfig {
    pub number_placements: u32,
    pub textures: Vec<String>,
    pub locked_textures: Vec<String>,
}

impl PieceConfig {
    pub fn with_count(number_placements: u32) -> Self {
        Self {
            number_placements,
            ..Self::default()
        }
    }
}

/// A rock pinned onto the playable rectangle, bottom-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RockPlacement {
    pub row: u32,
    pub col: u32,
}

/// Skins for the fixed pieces and fillers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FillerTextures {
    pub dirt: Vec<String>,
    pub rock: Vec<String>,
    pub beginning_side: Vec<String>,
    pub beginning_open: Vec<String>,
    pub beginning_corner: Vec<String>,
    pub end: Vec<String>,
}

/// Movable passage level: pieces are dragged from off-board slots onto the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MovablePassageConfig {
    pub number_tiles_x: u32,
    pub number_tiles_y: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub straight: PieceConfig,
    pub turn: PieceConfig,
    pub t_junction: PieceConfig,
    pub cross_junction: PieceConfig,
    pub rock_placements: Vec<RockPlacement>,
    pub textures: FillerTextures,
    pub physics: PhysicsConfig,
}

impl Default for MovablePassageConfig {
    fn default() -> Self {
        Self {
            number_tiles_x: 5,
            number_tiles_y: 5,
            start_column: 0,
            end_column: 4,
            straight: PieceConfig::with_count(6),
            turn: PieceConfig::with_count(6),
            t_junction: PieceConfig::with_count(2),
            cross_junction: PieceConfig::with_count(1),
            rock_placements: Vec::new(),
            textures: FillerTextures::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl MovablePassageConfig {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn playable_pieces(&self) -> u32 {
        self.straight
            .number_placements
            .saturating_add(self.turn.number_placements)
            .saturating_add(self.t_junction.number_placements)
            .saturating_add(self.cross_junction.number_placements)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.number_tiles_x == 0
            || self.number_tiles_y == 0
            || self.number_tiles_x.checked_mul(self.number_tiles_y).is_none()
        {
            return Err(LevelError::InvalidDimensions {
                rows: self.number_tiles_y,
                cols: self.number_tiles_x,
            });
        }
        if self.start_column >= self.number_tiles_x {
            return Err(LevelError::ColumnOutOfRange {
                which: "start",
                column: self.start_column,
                width: self.number_tiles_x,
            });
        }
        if self.end_column >= self.number_tiles_x {
            return Err(LevelError::ColumnOutOfRange {
                which: "end",
                column: self.end_column,
                width: self.number_tiles_x,
            });
        }
        if self.playable_pieces() == 0 {
            return Err(LevelError::NoPieces);
        }
        if let Some(rock) = self
            .rock_placements
            .iter()
            .find(|r| r.row >= self.number_tiles_y || r.col >= self.number_tiles_x)
        {
            return Err(LevelError::RockOutOfRange {
                row: rock.row,
                col: rock.col,
            });
        }
        Ok(())
    }
}

/// Rotatable passage level: every cell of a generated maze can be turned
///
/// The maze decides how many of each piece appear, so only the skins of the
/// piece entries are used. `NumberRows` sizes the maze the generator builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RotatablePassageConfig {
    pub number_rows: u32,
    pub straight: PieceConfig,
    pub turn: PieceConfig,
    pub t_junction: PieceConfig,
    pub cross_junction: PieceConfig,
    pub dead_end: PieceConfig,
    pub border_textures: Vec<String>,
    pub hole_texture: Option<String>,
    pub physics: PhysicsConfig,
}

impl Default for RotatablePassageConfig {
    fn default() -> Self {
        Self {
            number_rows: 10,
            straight: PieceConfig::default(),
            turn: PieceConfig::default(),
            t_junction: PieceConfig::default(),
            cross_junction: PieceConfig::default(),
            dead_end: PieceConfig::default(),
            border_textures: Vec::new(),
            hole_texture: None,
            physics: PhysicsConfig::default(),
        }
    }
}

impl RotatablePassageConfig {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.number_rows == 0 {
            return Err(LevelError::InvalidDimensions {
                rows: 0,
                cols: 0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MovablePassageConfig::from_json(
            r#"{ "NumberTilesX": 4, "NumberTilesY": 3, "StartColumn": 1, "EndColumn": 2,
                 "Straight": { "NumberPlacements": 3 },
                 "TJunction": { "NumberPlacements": 1 },
                 "RockPlacements": [ { "Row": 1, "Col": 3 } ],
                 "Physics": { "BounceEnabled": true } }"#,
        )
        .unwrap();
        assert_eq!(config.number_tiles_x, 4);
        assert_eq!(config.start_column, 1);
        assert_eq!(config.t_junction.number_placements, 1);
        // Omitted piece sections fall back to their defaults
        assert_eq!(config.turn.number_placements, 6);
        assert_eq!(config.rock_placements, vec![RockPlacement { row: 1, col: 3 }]);
        assert!(config.physics.bounce_enabled);
        assert_eq!(config.physics.drag_constant, DRAG_CONSTANT);
    }

    #[test]
    fn test_validate_rejects_bad_columns() {
        let config = MovablePassageConfig {
            end_column: 9,
            ..MovablePassageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LevelError::ColumnOutOfRange { which: "end", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_no_pieces() {
        let config = MovablePassageConfig {
            straight: PieceConfig::default(),
            turn: PieceConfig::default(),
            t_junction: PieceConfig::default(),
            cross_junction: PieceConfig::default(),
            ..MovablePassageConfig::default()
        };
        assert!(matches!(config.validate(), Err(LevelError::NoPieces)));
    }

    #[test]
    fn test_validate_rejects_overflowing_counts() {
        let config = MovablePassageConfig {
            number_tiles_x: u32::MAX,
            number_tiles_y: 2,
            ..MovablePassageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LevelError::InvalidDimensions { .. })
        ));
        let config = MovablePassageConfig {
            straight: PieceConfig::with_count(u32::MAX),
            turn: PieceConfig::with_count(u32::MAX),
            ..MovablePassageConfig::default()
        };
        assert_eq!(config.playable_pieces(), u32::MAX);
    }

    #[test]
    fn test_validate_rejects_rock_off_board() {
        let config = MovablePassageConfig {
            rock_placements: vec![RockPlacement { row: 5, col: 0 }],
            ..MovablePassageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LevelError::RockOutOfRange { row: 5, col: 0 })
        ));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            MovablePassageConfig::from_json("{ not json"),
            Err(LevelError::Json(_))
        ));
    }

    #[test]
    fn test_rotatable_config_round_trip() {
        let config = RotatablePassageConfig {
            hole_texture: Some("textures/hole.png".into()),
            ..RotatablePassageConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"NumberRows\""));
        assert!(json.contains("\"HoleTexture\""));
        assert_eq!(RotatablePassageConfig::from_json(&json).unwrap(), config);
    }
}
