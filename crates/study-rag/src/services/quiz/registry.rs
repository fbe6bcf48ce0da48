//! Named study material available to the quiz generator

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ingestion::TextChunker;

#[derive(Default)]
struct Material {
    texts: Vec<String>,
    chunks: Option<Arc<Vec<String>>>,
}

/// Material name → texts, chunked lazily on first use.
///
/// Constructed once and shared by the upload path (which registers material)
/// and the quiz generator (which reads it).
pub struct QuizMaterialRegistry {
    chunker: TextChunker,
    materials: RwLock<BTreeMap<String, Material>>,
}

impl QuizMaterialRegistry {
    pub fn new(chunker: TextChunker) -> Self {
        Self {
            chunker,
            materials: RwLock::new(BTreeMap::new()),
        }
    }

    /// Append texts to a material, creating it on first use.
    ///
    /// Documents sharing a title accumulate under one name; the cached chunks
    /// are dropped so the next read re-splits everything.
    pub fn register(&self, name: impl Into<String>, texts: Vec<String>) {
        let name = name.into();
        let mut materials = self.materials.write();
        let material = materials.entry(name.clone()).or_default();
        material.texts.extend(texts);
        material.chunks = None;
        tracing::debug!(
            "Registered quiz material '{}' ({} texts)",
            name,
            material.texts.len()
        );
    }

    /// All material names in sorted order
    pub fn list_materials(&self) -> Vec<String> {
        self.materials.read().keys().cloned().collect()
    }

    /// Material names starting with `prefix`, sorted
    pub fn materials_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.materials
            .read()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.read().contains_key(name)
    }

    /// Chunks of a material: its texts merged with blank lines, then split
    pub fn chunks(&self, name: &str) -> Result<Arc<Vec<String>>> {
        if let Some(material) = self.materials.read().get(name) {
            if let Some(chunks) = &material.chunks {
                return Ok(Arc::clone(chunks));
            }
        }

        let mut materials = self.materials.write();
        let material = materials
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("quiz material '{}'", name)))?;

        let chunks = match &material.chunks {
            Some(chunks) => Arc::clone(chunks),
            None => {
                let merged = material.texts.join("\n\n");
                let chunks = Arc::new(self.chunker.split_text(&merged));
                material.chunks = Some(Arc::clone(&chunks));
                chunks
            }
        };
        Ok(chunks)
    }
}
