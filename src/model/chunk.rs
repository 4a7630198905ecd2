//! Page-anchored text chunks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};

/// A unit of page text produced by the chunker.
///
/// Immutable once created; the text is trimmed and never empty, and the page
/// number is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    text: String,
    page: u32,
}

impl TextChunk {
    /// Create a chunk, rejecting empty text and page 0.
    pub fn new(text: impl Into<String>, page: u32) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidChunk("text is empty".to_string()));
        }
        if page == 0 {
            return Err(Error::InvalidChunk("page numbers start at 1".to_string()));
        }
        let text = if trimmed.len() == text.len() {
            text
        } else {
            trimmed.to_string()
        };
        Ok(Self { text, page })
    }

    /// The chunk text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The 1-based source page.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Page number to concatenated page text.
///
/// Used both as the alignment corpus and as `source_text` in the final output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageTextIndex {
    pages: BTreeMap<u32, String>,
}

impl PageTextIndex {
    /// Build the index from chunks, keeping extraction order within each page.
    pub fn from_chunks(chunks: &[TextChunk]) -> Self {
        let mut pages: BTreeMap<u32, String> = BTreeMap::new();
        for chunk in chunks {
            let text = pages.entry(chunk.page()).or_default();
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(chunk.text());
        }
        Self { pages }
    }

    /// Text of one page, if it has any.
    pub fn get(&self, page: u32) -> Option<&str> {
        self.pages.get(&page).map(String::as_str)
    }

    /// Pages with text, ascending.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// `(page, text)` pairs, ascending by page.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.pages.iter().map(|(p, t)| (*p, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
