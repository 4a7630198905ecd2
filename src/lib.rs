//! # docalign
//!
//! Page-anchored document decomposition and summary-to-source alignment.
//!
//! A document (PDF or DOCX) is decomposed into page-tagged text chunks, image
//! assets and a reference list. A summary of the document is then split into
//! paragraphs and every paragraph is anchored to the page it most likely came
//! from, together with that page's source text and images.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docalign::{decompose_file, ExtractOptions, JobContext};
//! use docalign::align::{AlignmentEngine, AlignmentRequest, LexicalIndex};
//!
//! fn main() -> docalign::Result<()> {
//!     let job = JobContext::new("./out");
//!     let doc = decompose_file("paper.pdf", &job, &ExtractOptions::default())?;
//!
//!     let pages = doc.page_text_index();
//!     let index = LexicalIndex::build(&pages);
//!     let summary = "First paragraph.\n\nSecond paragraph.";
//!     let request = AlignmentRequest::new(summary, &pages, &doc.images)
//!         .with_references(&doc.references)
//!         .with_index(&index);
//!
//!     for entry in AlignmentEngine::new().align(&request) {
//!         println!("page {}: {}", entry.page, entry.response);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **PDF decomposition**: reading-order text, raster images, rendered vector charts
//! - **DOCX decomposition**: one chunk per paragraph
//! - **Logo and header/footer filtering**
//! - **Reference extraction and citation markup**
//! - **Parallel processing**: uses Rayon for multi-page documents
//! - **Services** (default feature): Gemini summarization, image captioning,
//!   embeddings and an async end-to-end [`pipeline`]

pub mod align;
pub mod convert;
pub mod detect;
pub mod error;
pub mod job;
pub mod model;
pub mod parser;
pub mod render;
pub mod text;

#[cfg(feature = "services")]
pub mod pipeline;
#[cfg(feature = "services")]
pub mod service;

pub use align::{AlignOptions, AlignmentEngine, AlignmentRequest};
pub use convert::{Decomposer, DecomposerRegistry, DocxDecomposer, PdfDecomposer};
pub use detect::{detect_format_from_bytes, detect_format_from_path, DocumentKind, PdfFormat};
pub use error::{Error, Result};
pub use job::JobContext;
pub use model::{
    AlignedEntry, AssetKind, Decomposition, ImageAsset, PageRef, PageTextIndex, ReferenceTable,
    TextChunk,
};
pub use parser::{ErrorMode, ExtractOptions};
pub use render::JsonFormat;

#[cfg(feature = "services")]
pub use pipeline::{Pipeline, PipelineOutput};

use std::path::Path;

/// Decompose a PDF or DOCX file; the extension selects the format.
///
/// Images are written below `job`'s output directory.
///
/// # Example
///
/// ```no_run
/// use docalign::{decompose_file, ExtractOptions, JobContext};
///
/// let job = JobContext::new("./out");
/// let doc = decompose_file("report.docx", &job, &ExtractOptions::default()).unwrap();
/// println!("{} chunks", doc.chunks.len());
/// ```
pub fn decompose_file<P: AsRef<Path>>(
    path: P,
    job: &JobContext,
    options: &ExtractOptions,
) -> Result<Decomposition> {
    DecomposerRegistry::with_defaults().decompose(path.as_ref(), job, options)
}

/// Decompose document bytes of the declared file type (`"pdf"`, `"docx"`, ...).
pub fn decompose_bytes(
    data: &[u8],
    file_type: &str,
    job: &JobContext,
    options: &ExtractOptions,
) -> Result<Decomposition> {
    convert::decompose_bytes(data, file_type, job, options)
}

/// Split `summary` into paragraphs and anchor each to a page of `doc`,
/// using the lexical index.
pub fn align_summary(summary: &str, doc: &Decomposition) -> Vec<AlignedEntry> {
    let pages = doc.page_text_index();
    let index = align::LexicalIndex::build(&pages);
    let request = AlignmentRequest::new(summary, &pages, &doc.images)
        .with_references(&doc.references)
        .with_index(&index);
    AlignmentEngine::new().align(&request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_bytes_rejects_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobContext::with_id("t", dir.path());
        let result = decompose_bytes(b"hello", "txt", &job, &ExtractOptions::default());
        assert!(matches!(result, Err(Error::UnknownFormat(_))));
    }

    #[test]
    fn test_decompose_bytes_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobContext::with_id("t", dir.path());
        let result = decompose_bytes(b"not a pdf at all", "pdf", &job, &ExtractOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_align_summary_without_chunks_goes_unmatched() {
        let doc = Decomposition::new(DocumentKind::Pdf);
        let entries = align_summary("A paragraph.", &doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].page, PageRef::Unmatched);
    }
}
