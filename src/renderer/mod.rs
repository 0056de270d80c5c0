//! Rendering outputs
//!
//! Builds the per-frame draw data for a rendering backend: one model
//! transform per visible object plus the texture table it indexes into.

pub mod draw;
pub mod instance;
pub mod textures;

pub use draw::{DrawBuilder, DrawList};
pub use instance::{DrawInstance, DrawKind};
pub use textures::{TextureDescription, TextureTable};
