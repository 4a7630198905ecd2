//! Per-page structural extraction.

use super::backend::{LopdfBackend, PageId};
use super::content::{ContentInterpreter, PageContent, PlacedImage};
use super::geometry::Rect;
use super::layout::page_text;
use super::logo::is_likely_logo_with;
use super::merge::merge_rects;
use super::options::ExtractOptions;
use super::raster::{decode_image, encode_png};
use super::render::render_region;
use crate::error::{Error, Result};
use crate::job::JobContext;
use crate::model::{AssetKind, ImageAsset, TextChunk};
use crate::text::chunk_paragraphs;

/// What one page contributed to the decomposition.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// 1-based page number
    pub page: u32,
    /// Header/footer filtered page text, blocks separated by blank lines
    pub text: String,
    pub chunks: Vec<TextChunk>,
    /// Accepted raster images first, then chart regions
    pub images: Vec<ImageAsset>,
}

/// Extracts text chunks and image assets from single pages.
///
/// Holds no mutable state, so one extractor can serve pages on several
/// threads at once.
pub struct PageExtractor<'a> {
    backend: &'a LopdfBackend,
    job: &'a JobContext,
    options: &'a ExtractOptions,
}

impl<'a> PageExtractor<'a> {
    pub fn new(backend: &'a LopdfBackend, job: &'a JobContext, options: &'a ExtractOptions) -> Self {
        Self {
            backend,
            job,
            options,
        }
    }

    /// Extract one page.
    ///
    /// Failures of individual images or drawings are logged and skipped; only
    /// a page whose content cannot be interpreted is an error.
    pub fn extract(&self, page: u32, page_id: PageId) -> Result<PageExtraction> {
        let mut content = ContentInterpreter::new(self.backend).interpret_page(page_id)?;
        let spans = std::mem::take(&mut content.spans);

        let text = page_text(spans, content.height, self.options.header_footer_band);
        let chunks: Vec<TextChunk> = chunk_paragraphs(&text, &self.options.chunker)
            .into_iter()
            .filter_map(|c| TextChunk::new(c, page).ok())
            .collect();

        let occupied: Vec<Rect> = content
            .images
            .iter()
            .map(|img| img.bbox)
            .filter(|bbox| !bbox.is_empty())
            .collect();

        let mut images = Vec::new();
        if self.options.extract_images {
            images.extend(self.extract_rasters(page, &content));
        }
        if self.options.extract_drawings {
            images.extend(self.extract_charts(page, &content, &occupied));
        }

        log::debug!(
            "page {}: {} chunks, {} images",
            page,
            chunks.len(),
            images.len()
        );

        Ok(PageExtraction {
            page,
            text,
            chunks,
            images,
        })
    }

    fn extract_rasters(&self, page: u32, content: &PageContent<'_>) -> Vec<ImageAsset> {
        let mut assets = Vec::new();
        for (idx, placed) in content.images.iter().enumerate() {
            if placed.bbox.is_empty() {
                continue;
            }
            if is_likely_logo_with(
                &placed.bbox,
                content.width,
                content.height,
                self.options.raster_logo,
            ) {
                log::debug!("page {}: skipping logo image {} at {}", page, placed.name, placed.bbox);
                continue;
            }
            match self.save_raster(page, idx + 1, placed) {
                Ok(asset) => assets.push(asset),
                Err(e) => log::warn!("page {}: skipping image {}: {}", page, placed.name, e),
            }
        }
        assets
    }

    fn save_raster(&self, page: u32, index: usize, placed: &PlacedImage<'_>) -> Result<ImageAsset> {
        let img = decode_image(self.backend, placed.stream)?;
        let png = encode_png(&img)?;
        let name = self.job.asset_file_name(page, AssetKind::Raster, index);
        let path = self.job.write_asset(&name, &png)?;
        ImageAsset::raster(path, page)
    }

    fn extract_charts(
        &self,
        page: u32,
        content: &PageContent<'_>,
        occupied: &[Rect],
    ) -> Vec<ImageAsset> {
        let opts = self.options;
        let bounds: Vec<Rect> = content.paths.iter().map(|p| p.bbox).collect();
        let mut regions = merge_rects(&bounds, opts.merge_inflation);
        regions.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

        let page_rect = Rect::new(0.0, 0.0, content.width, content.height);
        let mut assets = Vec::new();
        let mut index = 1;

        for region in regions {
            if region.width() < opts.min_chart_size || region.height() < opts.min_chart_size {
                continue;
            }
            if occupied
                .iter()
                .any(|img| region.overlap_ratio(img) >= opts.max_image_overlap)
            {
                log::debug!("page {}: drawing {} lies under an image", page, region);
                continue;
            }
            if is_likely_logo_with(&region, content.width, content.height, opts.vector_logo) {
                log::debug!("page {}: skipping logo drawing at {}", page, region);
                continue;
            }

            match self.save_chart(page, index, content, &region, &page_rect) {
                Ok(Some(asset)) => {
                    assets.push(asset);
                    index += 1;
                }
                Ok(None) => log::debug!("page {}: drawing {} rendered blank", page, region),
                Err(e) => log::warn!("page {}: skipping drawing {}: {}", page, region, e),
            }
        }
        assets
    }

    fn save_chart(
        &self,
        page: u32,
        index: usize,
        content: &PageContent<'_>,
        region: &Rect,
        page_rect: &Rect,
    ) -> Result<Option<ImageAsset>> {
        let clip = region
            .intersection(page_rect)
            .map(|r| r.round_out())
            .ok_or_else(|| Error::Render(format!("{} lies outside the page", region)))?;

        let render = render_region(&content.paths, &clip, self.options.render_dpi)?;
        if render.is_blank(self.options.blank_png_bytes, self.options.blank_color_ratio) {
            return Ok(None);
        }

        let name = self.job.asset_file_name(page, AssetKind::Chart, index);
        let path = self.job.write_asset(&name, &render.png)?;
        ImageAsset::chart(path, page).map(Some)
    }
}
