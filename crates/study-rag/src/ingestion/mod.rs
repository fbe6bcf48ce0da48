//! Text normalization and chunking for uploaded study material

pub mod chunker;
pub mod normalize;

pub use chunker::TextChunker;
pub use normalize::clean_text;

use crate::types::{Chunk, ChunkMetadata, TextBlock};

/// Normalize every block, dropping blocks that end up empty
pub fn normalize_blocks(blocks: &[TextBlock]) -> Vec<TextBlock> {
    blocks
        .iter()
        .filter_map(|block| {
            let text = clean_text(&block.text);
            if text.is_empty() {
                None
            } else {
                Some(TextBlock {
                    text,
                    page: block.page,
                })
            }
        })
        .collect()
}

/// Split normalized blocks into chunks carrying document metadata.
///
/// Ordinals run across the whole document in block order; a block's page
/// number travels with each of its chunks.
pub fn prepare_chunks(
    chunker: &TextChunker,
    document_id: i64,
    blocks: &[TextBlock],
    base: &ChunkMetadata,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut ordinal = 0u32;

    for block in blocks {
        for text in chunker.split_text(&block.text) {
            let metadata = ChunkMetadata {
                page: block.page,
                ..base.clone()
            };
            chunks.push(Chunk::new(document_id, ordinal, text, metadata));
            ordinal += 1;
        }
    }

    tracing::debug!(
        "Prepared {} chunks from {} blocks for document {}",
        chunks.len(),
        blocks.len(),
        document_id
    );

    chunks
}
