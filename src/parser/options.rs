//! Extraction options and configuration.

use super::logo::LogoThresholds;
use crate::text::ChunkerConfig;

/// Options for decomposing a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for page-level failures
    pub error_mode: ErrorMode,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Whether to extract embedded raster images
    pub extract_images: bool,

    /// Whether to detect and render vector charts
    pub extract_drawings: bool,

    /// Resolution used when rendering chart regions
    pub render_dpi: f32,

    /// Fraction of the page height treated as header (top) and footer (bottom)
    pub header_footer_band: f32,

    /// Logo thresholds applied to raster images
    pub raster_logo: LogoThresholds,

    /// Logo thresholds applied to merged drawing regions
    pub vector_logo: LogoThresholds,

    /// Minimum width and height of a chart region, in points
    pub min_chart_size: f32,

    /// Fraction of a chart region covered by a raster image above which it is dropped
    pub max_image_overlap: f32,

    /// PNG encodings smaller than this are considered blank
    pub blank_png_bytes: usize,

    /// Dominant-colour share above which a render is considered blank
    pub blank_color_ratio: f32,

    /// Inflation used when merging drawing rectangles
    pub merge_inflation: f32,

    /// Paragraph chunking limits
    pub chunker: ChunkerConfig,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail the whole document when a page cannot be processed.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable raster image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable chart detection.
    pub fn with_drawings(mut self, extract: bool) -> Self {
        self.extract_drawings = extract;
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self.extract_drawings = false;
        self
    }

    /// Set the chart rendering resolution.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.render_dpi = dpi;
        self
    }

    /// Set the header/footer band as a fraction of the page height.
    pub fn with_header_footer_band(mut self, band: f32) -> Self {
        self.header_footer_band = band.clamp(0.0, 0.5);
        self
    }

    /// Set the chunker configuration.
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            extract_images: true,
            extract_drawings: true,
            render_dpi: 150.0,
            header_footer_band: 0.08,
            raster_logo: LogoThresholds::RASTER,
            vector_logo: LogoThresholds::VECTOR,
            min_chart_size: 40.0,
            max_image_overlap: 0.8,
            blank_png_bytes: 200,
            blank_color_ratio: 0.995,
            merge_inflation: 5.0,
            chunker: ChunkerConfig::default(),
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    Strict,
    /// Log and skip pages, images and drawings that fail
    #[default]
    Lenient,
}
