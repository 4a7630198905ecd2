//! Summary-to-source alignment.
//!
//! Maps each paragraph of an externally generated summary back to the source
//! page it most likely came from, attaches that page's image assets, and makes
//! sure every page carrying images shows up in the result.

mod engine;
mod index;

pub use engine::{AlignOptions, AlignmentEngine, AlignmentRequest};
pub use index::{LexicalIndex, Neighbor, SemanticIndex, VectorIndex};

use std::collections::BTreeMap;

/// Image captions grouped by page.
pub type PageCaptions = BTreeMap<u32, Vec<String>>;
