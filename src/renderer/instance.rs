//! Per-object instance data handed to the rendering backend

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::sim::{PieceKind, TextureVariant};

/// What a draw instance depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Piece(PieceKind),
    /// The finish marker of a level
    Finish,
    /// Frame drawn around a rotatable maze
    Border,
}

impl DrawKind {
    /// Stable code the shaders switch on
    pub fn code(self) -> u32 {
        match self {
            DrawKind::Piece(kind) => match kind {
                PieceKind::Straight => 0,
                PieceKind::Turn => 1,
                PieceKind::TJunction => 2,
                PieceKind::CrossJunction => 3,
                PieceKind::DeadEnd => 4,
                PieceKind::Open => 5,
                PieceKind::ClosedBottom => 6,
                PieceKind::ClosedCorner => 7,
                PieceKind::Dirt => 8,
                PieceKind::Rock => 9,
            },
            DrawKind::Finish => 16,
            DrawKind::Border => 17,
        }
    }
}

/// Texture variant codes
pub fn variant_code(variant: TextureVariant) -> u32 {
    match variant {
        TextureVariant::Movable => 0,
        TextureVariant::Locked => 1,
        TextureVariant::Filler => 2,
    }
}

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    pub model: [[f32; 4]; 4], // offset 0
    pub variant: u32,         // offset 64
    pub kind: u32,            // offset 68
    pub texture: u32,         // offset 72
    pub _pad: u32,            // pad to 80 bytes
}

impl DrawInstance {
    pub fn new(model: Mat4, variant: TextureVariant, kind: DrawKind, texture: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            variant: variant_code(variant),
            kind: kind.code(),
            texture,
            _pad: 0,
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<DrawInstance>(), 80);
        let inst = DrawInstance::new(
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            TextureVariant::Locked,
            DrawKind::Piece(PieceKind::Turn),
            7,
        );
        let bytes: &[u8] = bytemuck::bytes_of(&inst);
        assert_eq!(bytes.len(), 80);
        assert_eq!(inst.model().w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!((inst.variant, inst.kind, inst.texture), (1, 1, 7));
    }
}
