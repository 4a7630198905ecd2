//! End-to-end processing: decompose, caption, summarize, align.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::align::{
    AlignOptions, AlignmentEngine, AlignmentRequest, LexicalIndex, PageCaptions, SemanticIndex,
};
use crate::convert::DecomposerRegistry;
use crate::error::{Error, Result};
use crate::job::JobContext;
use crate::model::{AlignedEntry, Decomposition, PageRef};
use crate::parser::ExtractOptions;
use crate::service::{
    build_vector_index, caption_images, Captioner, Embedder, GeminiClient, SummaryRequest,
    Summarizer,
};
use crate::text::split_paragraphs;

/// Wall-clock time spent in each stage, in seconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timings {
    pub decompose_secs: f64,
    pub caption_secs: f64,
    pub summary_secs: f64,
    pub align_secs: f64,
    /// Words in the generated summary
    pub summary_words: usize,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub entries: Vec<AlignedEntry>,
    pub decomposition: Decomposition,
    pub summary: String,
    pub captions: PageCaptions,
    pub timings: Timings,
}

/// Document summarization pipeline with pluggable services.
///
/// # Example
///
/// ```no_run
/// use docalign::pipeline::Pipeline;
/// use docalign::service::{GeminiClient, ServiceConfig};
/// use docalign::JobContext;
/// use std::sync::Arc;
///
/// # async fn run() -> docalign::Result<()> {
/// let client = GeminiClient::connect(ServiceConfig::from_env()?).await?;
/// let pipeline = Pipeline::with_client(Arc::new(client));
/// let output = pipeline.process_file("paper.pdf", &JobContext::new("./out")).await?;
/// println!("{} entries", output.entries.len());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    registry: Arc<DecomposerRegistry>,
    extract: ExtractOptions,
    align: AlignOptions,
    summarizer: Arc<dyn Summarizer>,
    captioner: Option<Arc<dyn Captioner>>,
    embedder: Option<Arc<dyn Embedder>>,
    concurrency: usize,
    min_paragraphs: usize,
}

impl Pipeline {
    /// Pipeline with a summarizer only: no captions, lexical page lookup.
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            registry: Arc::new(DecomposerRegistry::with_defaults()),
            extract: ExtractOptions::default(),
            align: AlignOptions::default(),
            summarizer,
            captioner: None,
            embedder: None,
            concurrency: 5,
            min_paragraphs: 3,
        }
    }

    /// Pipeline using one client for every service.
    pub fn with_client(client: Arc<GeminiClient>) -> Self {
        let concurrency = client.config().concurrency;
        Self::new(client.clone())
            .with_captioner(client.clone())
            .with_embedder(client)
            .with_concurrency(concurrency)
    }

    pub fn with_captioner(mut self, captioner: Arc<dyn Captioner>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    pub fn with_align_options(mut self, options: AlignOptions) -> Self {
        self.align = options;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_min_paragraphs(mut self, n: usize) -> Self {
        self.min_paragraphs = n;
        self
    }

    /// Process a file; the extension selects the decomposer.
    pub async fn process_file<P: AsRef<Path>>(&self, path: P, job: &JobContext) -> Result<PipelineOutput> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnknownFormat("file has no extension".into()))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(bytes, &ext, job).await
    }

    /// Process document bytes of the declared type.
    pub async fn process_bytes(&self, bytes: Vec<u8>, ext: &str, job: &JobContext) -> Result<PipelineOutput> {
        let started = Instant::now();
        let registry = self.registry.clone();
        let options = self.extract.clone();
        let ext_owned = ext.to_string();
        let job_owned = job.clone();
        let decomposition = tokio::task::spawn_blocking(move || {
            registry.decompose_bytes(&bytes, &ext_owned, &job_owned, &options)
        })
        .await
        .map_err(|e| Error::Other(format!("decomposition task failed: {e}")))??;
        let decompose_secs = started.elapsed().as_secs_f64();

        let mut output = self.process_decomposition(decomposition, job).await?;
        output.timings.decompose_secs = decompose_secs;
        Ok(output)
    }

    /// Run the service stages over an existing decomposition.
    pub async fn process_decomposition(
        &self,
        decomposition: Decomposition,
        job: &JobContext,
    ) -> Result<PipelineOutput> {
        if !decomposition.has_text() {
            return Err(Error::EmptyDocument);
        }
        let mut timings = Timings::default();
        let pages = decomposition.page_text_index();

        let started = Instant::now();
        let captions = match &self.captioner {
            Some(captioner) if !decomposition.images.is_empty() => {
                caption_images(
                    captioner.as_ref(),
                    &decomposition.images,
                    job,
                    &pages,
                    self.concurrency,
                )
                .await
            }
            _ => PageCaptions::new(),
        };
        timings.caption_secs = started.elapsed().as_secs_f64();

        let request = SummaryRequest::new(combined_text(&decomposition.full_text, &captions))
            .with_references(decomposition.references.to_numbered_list())
            .with_min_paragraphs(self.min_paragraphs);
        let started = Instant::now();
        let summary = match self.summarizer.summarize(&request).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("summarization failed: {}", e);
                format!("Error generating summary: {}", e)
            }
        };
        timings.summary_secs = started.elapsed().as_secs_f64();
        timings.summary_words = summary.split_whitespace().count();
        log::info!(
            "Summary generation time: {} seconds, word count: {}",
            timings.summary_secs as u64,
            timings.summary_words
        );

        let started = Instant::now();
        let entries = if decomposition.chunks.is_empty() {
            vec![AlignedEntry::new(
                PageRef::Unmatched,
                summary.clone(),
                self.align.unmatched_source.clone(),
            )]
        } else {
            let index = self.build_index(&decomposition, &summary).await;
            let mut request = AlignmentRequest::new(&summary, &pages, &decomposition.images)
                .with_references(&decomposition.references)
                .with_captions(&captions);
            if let Some(index) = index.as_deref() {
                request = request.with_index(index);
            }
            AlignmentEngine::with_options(self.align.clone()).align(&request)
        };
        timings.align_secs = started.elapsed().as_secs_f64();

        Ok(PipelineOutput {
            entries,
            decomposition,
            summary,
            captions,
            timings,
        })
    }

    /// Embedding index when an embedder is configured, the lexical index
    /// otherwise. A failing embedder leaves the run without an index.
    async fn build_index(
        &self,
        decomposition: &Decomposition,
        summary: &str,
    ) -> Option<Box<dyn SemanticIndex>> {
        let pages = decomposition.page_text_index();
        match &self.embedder {
            Some(embedder) => {
                let queries = split_paragraphs(summary);
                match build_vector_index(embedder.as_ref(), &pages, &queries).await {
                    Ok(index) => Some(Box::new(index)),
                    Err(e) => {
                        log::warn!("could not build the embedding index: {}", e);
                        None
                    }
                }
            }
            None => Some(Box::new(LexicalIndex::build(&pages))),
        }
    }
}

/// Full text followed by the image captions, as sent to the summarizer.
pub fn combined_text(full_text: &str, captions: &PageCaptions) -> String {
    let mut text = full_text.to_string();
    if captions.values().all(|c| c.is_empty()) {
        return text;
    }
    text.push_str("\n\n--- Image Summaries ---\n");
    for (page, lines) in captions {
        for line in lines {
            text.push_str(&format!("Page {}: {}\n", page, line));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text() {
        let mut captions = PageCaptions::new();
        assert_eq!(combined_text("Body.", &captions), "Body.");

        captions.insert(3, vec!["Bar chart.".to_string()]);
        captions.insert(1, vec!["Photo.".to_string(), "Logo.".to_string()]);
        assert_eq!(
            combined_text("Body.", &captions),
            "Body.\n\n--- Image Summaries ---\nPage 1: Photo.\nPage 1: Logo.\nPage 3: Bar chart.\n"
        );
    }
}
