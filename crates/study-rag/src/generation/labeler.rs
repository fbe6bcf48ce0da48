//! Numbered citation labels for prompt context

use std::collections::BTreeMap;

use crate::types::{Chunk, RankedChunk};

/// Characters of chunk text shown when a source has no page number
const SNIPPET_CHARS: usize = 70;

/// Labeled context handed to the model plus the label → source map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledContext {
    /// `"[1] text\n\n[2] text..."`
    pub context: String,
    pub labels: BTreeMap<u32, String>,
    passages: Vec<String>,
}

impl LabeledContext {
    /// Label passages 1..=n in the given order
    pub fn build(passages: &[RankedChunk]) -> Self {
        let mut labeled = Self::default();
        labeled.extend(passages.iter().map(|p| &p.chunk));
        labeled
    }

    /// Append more chunks, continuing the numbering
    pub fn extend<'a, I>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        for chunk in chunks {
            let label = self.labels.len() as u32 + 1;
            self.labels.insert(label, format_source(chunk));
            self.passages.push(format!("[{}] {}", label, chunk.text));
        }
        self.context = self.passages.join("\n\n");
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

/// Human-readable descriptor for a chunk's source.
///
/// `"<source>, p.<page>"` when the chunk has a page, otherwise the source
/// followed by a quoted snippet of the first 70 characters.
pub fn format_source(chunk: &Chunk) -> String {
    let source = if chunk.metadata.source_name.is_empty() {
        "Unknown"
    } else {
        chunk.metadata.source_name.as_str()
    };

    match chunk.metadata.page {
        Some(page) => format!("{}, p.{}", source, page),
        None => {
            let snippet: String = chunk
                .text
                .chars()
                .take(SNIPPET_CHARS)
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect();
            format!("{}: \"{}...\"", source, snippet)
        }
    }
}
