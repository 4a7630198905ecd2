//! Clients for the external summarization, vision and embedding services.
//!
//! The pipeline only sees the [`Summarizer`], [`Captioner`] and [`Embedder`]
//! traits; [`GeminiClient`] implements all three over HTTP.

mod batch;
mod config;
mod error;
mod gemini;
mod retry;

pub use batch::{build_vector_index, caption_images};
pub use config::{ServiceConfig, API_KEY_VAR};
pub use error::ServiceError;
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

/// Input of one summarization call.
#[derive(Debug, Clone, Default)]
pub struct SummaryRequest {
    /// Document text, optionally followed by image captions
    pub text: String,
    /// Numbered reference list the summary may cite
    pub references: Option<String>,
    /// Lower bound on blank-line separated paragraphs
    pub min_paragraphs: usize,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: None,
            min_paragraphs: 3,
        }
    }

    pub fn with_references(mut self, references: impl Into<String>) -> Self {
        let references = references.into();
        self.references = (!references.trim().is_empty()).then_some(references);
        self
    }

    pub fn with_min_paragraphs(mut self, n: usize) -> Self {
        self.min_paragraphs = n;
        self
    }
}

/// Result of captioning one image.
///
/// Failures are values: they render as ordinary caption text so one bad image
/// never fails a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionOutcome {
    Caption(String),
    /// The image file does not exist
    NotFound(String),
    /// Rate limiting persisted through every retry
    RateLimited,
    /// Any other failure, with the image file name
    Failed(String),
    /// No vision-capable model is configured
    Unavailable,
}

impl CaptionOutcome {
    pub fn is_caption(&self) -> bool {
        matches!(self, CaptionOutcome::Caption(_))
    }
}

impl fmt::Display for CaptionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionOutcome::Caption(text) => f.write_str(text.trim()),
            CaptionOutcome::NotFound(name) => write!(f, "Image not found: {}", name),
            CaptionOutcome::RateLimited => {
                f.write_str("Could not analyse image: rate limit exceeded.")
            }
            CaptionOutcome::Failed(name) => write!(f, "Could not process image: {}", name),
            CaptionOutcome::Unavailable => f.write_str("Vision model unavailable."),
        }
    }
}

/// Produces a narrative summary of document text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summary paragraphs separated by blank lines.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, ServiceError>;
}

/// Describes an image.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &Path, page_context: Option<&str>) -> CaptionOutcome;
}

/// Maps texts to dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;
}
