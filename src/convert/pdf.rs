//! PDF decomposer.

use std::path::Path;

use rayon::prelude::*;

use super::Decomposer;
use crate::detect::{detect_format_from_bytes, detect_format_from_path, DocumentKind};
use crate::error::Result;
use crate::job::JobContext;
use crate::model::Decomposition;
use crate::parser::{ErrorMode, ExtractOptions, LopdfBackend, PageExtraction, PageExtractor};
use crate::text::extract_references;

/// Decomposes PDF documents page by page.
#[derive(Debug, Clone, Default)]
pub struct PdfDecomposer {
    _private: (),
}

impl PdfDecomposer {
    /// Create a new PDF decomposer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn decompose_backend(
        &self,
        backend: &LopdfBackend,
        job: &JobContext,
        options: &ExtractOptions,
    ) -> Result<Decomposition> {
        let pages: Vec<_> = backend.pages().into_iter().collect();
        let extractor = PageExtractor::new(backend, job, options);

        let extract = |&(num, id): &(u32, _)| -> Result<Option<PageExtraction>> {
            match extractor.extract(num, id) {
                Ok(page) => Ok(Some(page)),
                Err(e) => {
                    if options.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Failed to extract page {}: {}", num, e);
                    Ok(None)
                }
            }
        };

        let results: Vec<Result<Option<PageExtraction>>> = if options.parallel {
            pages.par_iter().map(extract).collect()
        } else {
            pages.iter().map(extract).collect()
        };

        let mut extracted = Vec::with_capacity(results.len());
        for result in results {
            if let Some(page) = result? {
                extracted.push(page);
            }
        }
        extracted.sort_by_key(|p| p.page);

        let mut doc = Decomposition::new(DocumentKind::Pdf);
        doc.page_count = backend.page_count();
        doc.full_text = extracted
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string();
        for page in extracted {
            doc.chunks.extend(page.chunks);
            doc.images.extend(page.images);
        }
        doc.references = extract_references(&doc.full_text);

        log::info!(
            "decomposed PDF {}: {} pages, {} chunks, {} images, {} references",
            backend.version(),
            doc.page_count,
            doc.chunks.len(),
            doc.images.len(),
            doc.references.len()
        );
        Ok(doc)
    }
}

impl Decomposer for PdfDecomposer {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn decompose(&self, path: &Path, job: &JobContext, options: &ExtractOptions) -> Result<Decomposition> {
        detect_format_from_path(path)?;
        let backend = LopdfBackend::load_file(path)?;
        self.decompose_backend(&backend, job, options)
    }

    fn decompose_bytes(
        &self,
        bytes: &[u8],
        job: &JobContext,
        options: &ExtractOptions,
    ) -> Result<Decomposition> {
        detect_format_from_bytes(bytes)?;
        let backend = LopdfBackend::load_bytes(bytes)?;
        self.decompose_backend(&backend, job, options)
    }
}
