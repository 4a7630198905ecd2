//! PDF structural extraction.
//!
//! The pipeline per page is: interpret the content stream
//! ([`ContentInterpreter`]), rebuild reading-order text ([`layout`]), decode
//! and persist raster images ([`raster`]), and merge and render vector
//! drawings ([`merge`], [`render`]). [`PageExtractor`] drives all of it.

mod backend;
mod cmap;
mod content;
pub mod geometry;
pub mod layout;
pub mod logo;
pub mod merge;
mod options;
mod page;
pub mod raster;
pub mod render;

pub use backend::{LopdfBackend, PageId};
pub use cmap::{FontDecoder, ToUnicodeMap};
pub use content::{ContentInterpreter, PageContent, PathSegment, PathShape, PlacedImage, TextSpan};
pub use geometry::{Matrix, Rect};
pub use layout::{Column, TextBlock, TextLine};
pub use logo::{is_likely_logo, LogoThresholds};
pub use merge::merge_rects;
pub use options::{ErrorMode, ExtractOptions};
pub use page::{PageExtraction, PageExtractor};
