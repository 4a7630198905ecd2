//! Page-grouped alignment output records.

use serde::{Serialize, Serializer};

/// Page anchor of an aligned entry.
///
/// Ordering is the final output order: numbered pages ascending, then the
/// unmatched bucket, then paragraphs whose lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageRef {
    /// A 1-based source page
    Page(u32),
    /// No semantic index was available ("N/A")
    Unmatched,
    /// The lookup for this paragraph failed ("not found")
    NotFound,
}

impl PageRef {
    /// The page number, if this entry is anchored to one.
    pub fn number(&self) -> Option<u32> {
        match self {
            PageRef::Page(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageRef::Page(n) => write!(f, "{}", n),
            PageRef::Unmatched => write!(f, "N/A"),
            PageRef::NotFound => write!(f, "not found"),
        }
    }
}

impl Serialize for PageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Record discriminator carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Unified,
}

/// Summary text aligned to one source page (or to a fallback bucket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignedEntry {
    pub page: PageRef,
    pub response: String,
    pub source_text: String,
    pub images: Vec<String>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl AlignedEntry {
    pub fn new(page: PageRef, response: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            page,
            response: response.into(),
            source_text: source_text.into(),
            images: Vec::new(),
            kind: EntryKind::Unified,
        }
    }

    /// Append another paragraph, separated by a blank line.
    pub fn push_paragraph(&mut self, paragraph: &str) {
        if self.response.is_empty() {
            self.response.push_str(paragraph);
        } else {
            self.response.push_str("\n\n");
            self.response.push_str(paragraph);
        }
    }

    /// Attach an image path unless it is already present.
    pub fn attach_image(&mut self, path: &str) -> bool {
        if self.images.iter().any(|p| p == path) {
            return false;
        }
        self.images.push(path.to_string());
        true
    }
}
