//! Image assets persisted by the page extractor.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An image persisted for a page.
///
/// `path` is relative to the job's output root (e.g. `images/<job>_page2_img1.png`)
/// so it can be served or referenced without leaking absolute locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageAsset {
    path: String,
    page: u32,
    kind: AssetKind,
}

impl ImageAsset {
    /// Create an asset, rejecting empty or absolute paths and page 0.
    pub fn new(path: impl Into<String>, page: u32, kind: AssetKind) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(Error::InvalidAsset("path is empty".to_string()));
        }
        if path.starts_with('/') || path.contains(":\\") {
            return Err(Error::InvalidAsset(format!("path must be relative: {}", path)));
        }
        if page == 0 {
            return Err(Error::InvalidAsset("page numbers start at 1".to_string()));
        }
        Ok(Self {
            path: path.replace('\\', "/"),
            page,
            kind,
        })
    }

    /// Create a raster image asset.
    pub fn raster(path: impl Into<String>, page: u32) -> Result<Self> {
        Self::new(path, page, AssetKind::Raster)
    }

    /// Create a rendered vector-chart asset.
    pub fn chart(path: impl Into<String>, page: u32) -> Result<Self> {
        Self::new(path, page, AssetKind::Chart)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// File name component of the path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Where an asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Embedded raster image
    Raster,
    /// Rendered vector-drawing region
    Chart,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Raster => write!(f, "img"),
            AssetKind::Chart => write!(f, "chart"),
        }
    }
}
