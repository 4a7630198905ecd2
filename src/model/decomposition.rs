//! The per-document extraction result.

use serde::Serialize;

use super::{ImageAsset, PageTextIndex, ReferenceTable, TextChunk};
use crate::detect::DocumentKind;

/// Everything the decomposer extracted from one document.
#[derive(Debug, Clone, Serialize)]
pub struct Decomposition {
    /// Source format
    #[serde(serialize_with = "serialize_kind")]
    pub kind: DocumentKind,

    /// Number of pages (paragraphs for word-processor input)
    pub page_count: u32,

    /// Text chunks in page order, extraction order within a page
    pub chunks: Vec<TextChunk>,

    /// Image assets in page order
    pub images: Vec<ImageAsset>,

    /// Full document text, pages separated by blank lines
    pub full_text: String,

    /// Parsed reference list
    pub references: ReferenceTable,
}

fn serialize_kind<S: serde::Serializer>(
    kind: &DocumentKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.extension())
}

impl Decomposition {
    /// Create an empty result for the given format.
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            page_count: 0,
            chunks: Vec::new(),
            images: Vec::new(),
            full_text: String::new(),
            references: ReferenceTable::new(),
        }
    }

    /// Build the page → text index over the chunks.
    pub fn page_text_index(&self) -> PageTextIndex {
        PageTextIndex::from_chunks(&self.chunks)
    }

    /// Images belonging to one page, in extraction order.
    pub fn images_on_page(&self, page: u32) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter().filter(move |img| img.page() == page)
    }

    /// Whether any text was extracted.
    pub fn has_text(&self) -> bool {
        !self.full_text.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.images.is_empty()
    }
}
