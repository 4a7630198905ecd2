//! Record types shared by the decomposer and the alignment engine.
//!
//! Everything here is produced once per document-processing request: the
//! decomposer owns chunks, assets and references, the alignment engine borrows
//! them and returns its own [`AlignedEntry`] list.

mod asset;
mod chunk;
mod decomposition;
mod entry;
mod reference;

pub use asset::{AssetKind, ImageAsset};
pub use chunk::{PageTextIndex, TextChunk};
pub use decomposition::Decomposition;
pub use entry::{AlignedEntry, EntryKind, PageRef};
pub use reference::{ReferenceEntry, ReferenceTable};
