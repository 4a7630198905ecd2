//! Bounded fan-out over the services.

use futures::stream::{self, StreamExt};

use super::{CaptionOutcome, Captioner, Embedder, ServiceError};
use crate::align::{PageCaptions, VectorIndex};
use crate::job::JobContext;
use crate::model::{ImageAsset, PageTextIndex};

/// Caption every asset with at most `concurrency` calls in flight.
///
/// Results keep the asset order. Unavailable-model outcomes are dropped; every
/// other failure is kept as caption text.
pub async fn caption_images(
    captioner: &dyn Captioner,
    assets: &[ImageAsset],
    job: &JobContext,
    pages: &PageTextIndex,
    concurrency: usize,
) -> PageCaptions {
    let outcomes: Vec<(u32, CaptionOutcome)> = stream::iter(assets)
        .map(|asset| async move {
            let path = job.resolve(asset.path());
            let outcome = captioner.caption(&path, pages.get(asset.page())).await;
            (asset.page(), outcome)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut captions = PageCaptions::new();
    let mut failed = 0;
    for (page, outcome) in outcomes {
        if outcome == CaptionOutcome::Unavailable {
            continue;
        }
        if !outcome.is_caption() {
            failed += 1;
        }
        captions.entry(page).or_default().push(outcome.to_string());
    }
    log::info!("captioned {} images ({} failed)", assets.len(), failed);
    captions
}

/// Embed every page and every query and build a [`VectorIndex`].
pub async fn build_vector_index(
    embedder: &dyn Embedder,
    pages: &PageTextIndex,
    queries: &[String],
) -> Result<VectorIndex, ServiceError> {
    let page_numbers: Vec<u32> = pages.pages().collect();
    let page_count = page_numbers.len();
    let mut texts: Vec<String> = pages.iter().map(|(_, text)| text.to_string()).collect();
    texts.extend(queries.iter().map(|q| q.trim().to_string()));

    let mut vectors = embedder.embed(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(ServiceError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            texts.len(),
            vectors.len()
        )));
    }

    let query_vectors = vectors.split_off(page_count);
    let query_texts = texts.split_off(page_count);
    let page_vectors: Vec<(u32, Vec<f32>)> = page_numbers.into_iter().zip(vectors).collect();

    VectorIndex::from_embeddings(page_vectors, query_texts.into_iter().zip(query_vectors))
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}
