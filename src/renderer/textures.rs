//! Texture descriptions and the table the backend builds textures from

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How the backend should produce a texture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureDescription {
    /// Image file in the asset tree
    Path(String),
    /// Text rasterized by the backend
    GeneratedText { text: String, height_px: u32 },
    /// Plain placeholder
    Dummy,
}

/// Interned texture descriptions
///
/// `generation` increases every time a description is seen for the first
/// time, so the backend knows when to rebuild its textures.
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    entries: Vec<TextureDescription>,
    lookup: HashMap<TextureDescription, u32>,
    generation: u64,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `description`, adding it if new
    pub fn intern(&mut self, description: TextureDescription) -> u32 {
        if let Some(&index) = self.lookup.get(&description) {
            return index;
        }
        let index = self.entries.len() as u32;
        self.entries.push(description.clone());
        self.lookup.insert(description, index);
        self.generation += 1;
        index
    }

    pub fn get(&self, index: u32) -> Option<&TextureDescription> {
        self.entries.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureDescription> {
        self.entries.iter()
    }
}
