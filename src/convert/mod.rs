//! Document decomposers with a registry keyed by file extension.
//!
//! A [`Decomposer`] turns one input document into a [`Decomposition`]:
//! page-anchored text chunks, persisted image assets, the full text and the
//! parsed reference list. The [`DecomposerRegistry`] dispatches on the
//! declared file type.
//!
//! # Example
//!
//! ```no_run
//! use docalign::convert::DecomposerRegistry;
//! use docalign::{ExtractOptions, JobContext};
//! use std::path::Path;
//!
//! fn main() -> docalign::Result<()> {
//!     let registry = DecomposerRegistry::with_defaults();
//!     let job = JobContext::new("./output");
//!     let doc = registry.decompose(Path::new("paper.pdf"), &job, &ExtractOptions::default())?;
//!     println!("{} chunks, {} images", doc.chunks.len(), doc.images.len());
//!     Ok(())
//! }
//! ```

mod docx;
mod pdf;

pub use docx::DocxDecomposer;
pub use pdf::PdfDecomposer;

use crate::error::{Error, Result};
use crate::job::JobContext;
use crate::model::Decomposition;
use crate::parser::ExtractOptions;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Trait for document decomposers.
///
/// Implement this trait to add support for a new input format.
pub trait Decomposer: Send + Sync {
    /// Supported file extensions, lowercase without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this decomposer.
    fn name(&self) -> &str;

    /// Decompose in-memory document bytes.
    fn decompose_bytes(
        &self,
        bytes: &[u8],
        job: &JobContext,
        options: &ExtractOptions,
    ) -> Result<Decomposition>;

    /// Decompose a file.
    fn decompose(&self, path: &Path, job: &JobContext, options: &ExtractOptions) -> Result<Decomposition> {
        let bytes = std::fs::read(path)?;
        self.decompose_bytes(&bytes, job, options)
    }

    /// Check if this decomposer supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.trim_start_matches('.').to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for document decomposers.
pub struct DecomposerRegistry {
    decomposers: HashMap<String, Arc<dyn Decomposer>>,
    by_name: HashMap<String, Arc<dyn Decomposer>>,
}

impl DecomposerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            decomposers: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the PDF and DOCX decomposers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfDecomposer::new()));
        registry.register(Arc::new(DocxDecomposer::new()));
        registry
    }

    /// Register a decomposer for all its supported extensions.
    pub fn register(&mut self, decomposer: Arc<dyn Decomposer>) {
        for ext in decomposer.supported_extensions() {
            self.decomposers
                .insert(ext.to_lowercase(), decomposer.clone());
        }
        self.by_name
            .insert(decomposer.name().to_lowercase(), decomposer);
    }

    /// Get a decomposer by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn Decomposer>> {
        self.decomposers
            .get(&ext.trim_start_matches('.').to_lowercase())
            .cloned()
    }

    /// Get a decomposer by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Decomposer>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.get_by_extension(ext).is_some()
    }

    /// Get all supported extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.decomposers.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Decompose a file using the decomposer for its extension.
    pub fn decompose(
        &self,
        path: &Path,
        job: &JobContext,
        options: &ExtractOptions,
    ) -> Result<Decomposition> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnknownFormat("file has no extension".into()))?;

        self.lookup(ext)?.decompose(path, job, options)
    }

    /// Decompose bytes, choosing the decomposer from the declared type.
    pub fn decompose_bytes(
        &self,
        bytes: &[u8],
        ext: &str,
        job: &JobContext,
        options: &ExtractOptions,
    ) -> Result<Decomposition> {
        self.lookup(ext)?.decompose_bytes(bytes, job, options)
    }

    fn lookup(&self, ext: &str) -> Result<Arc<dyn Decomposer>> {
        self.get_by_extension(ext)
            .ok_or_else(|| Error::UnknownFormat(format!("no decomposer for file type: {}", ext)))
    }
}

impl Default for DecomposerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Decompose bytes of the declared type with the default decomposers.
pub fn decompose_bytes(
    bytes: &[u8],
    ext: &str,
    job: &JobContext,
    options: &ExtractOptions,
) -> Result<Decomposition> {
    DecomposerRegistry::with_defaults().decompose_bytes(bytes, ext, job, options)
}
