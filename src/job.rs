//! Per-request job context: identity and output locations.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;
use crate::model::AssetKind;

/// Directory (relative to the output root) holding extracted assets.
pub const IMAGES_DIR: &str = "images";

/// Identity and output directory of one decomposition job.
///
/// The id prefixes every file the job writes, so concurrent jobs can share an
/// output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    id: String,
    output_dir: PathBuf,
}

impl JobContext {
    /// New job with a random id.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_id(Uuid::new_v4().simple().to_string(), output_dir)
    }

    /// Job with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let id: String = id.into();
        let id = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        Self {
            id,
            output_dir: output_dir.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Absolute directory assets are written to.
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(IMAGES_DIR)
    }

    /// File name of the `index`-th asset of `kind` on `page`.
    pub fn asset_file_name(&self, page: u32, kind: AssetKind, index: usize) -> String {
        format!("{}_page{}_{}{}.png", self.id, page, kind, index)
    }

    /// Write an asset and return its path relative to the output directory.
    pub fn write_asset(&self, file_name: &str, data: &[u8]) -> Result<String> {
        let dir = self.images_dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file_name), data)?;
        Ok(format!("{IMAGES_DIR}/{file_name}"))
    }

    /// Resolve a relative asset path against the output directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.output_dir.join(relative)
    }

    /// Remove every asset this job wrote. Returns the number of files removed.
    pub fn cleanup(&self) -> Result<usize> {
        let dir = self.images_dir();
        if !dir.exists() {
            return Ok(0);
        }
        let prefix = format!("{}_", self.id);
        let mut removed = 0;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        log::info!("job {}: removed {} assets", self.id, removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_names_are_job_scoped() {
        let job = JobContext::with_id("abc", "/tmp/out");
        assert_eq!(job.asset_file_name(2, AssetKind::Raster, 1), "abc_page2_img1.png");
        assert_eq!(job.asset_file_name(3, AssetKind::Chart, 4), "abc_page3_chart4.png");
    }

    #[test]
    fn test_id_is_sanitized() {
        let job = JobContext::with_id("../evil id", "/tmp");
        assert_eq!(job.id(), "___evil_id");
        assert_eq!(JobContext::new("/tmp").id().len(), 32);
    }

    #[test]
    fn test_write_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobContext::with_id("job1", dir.path());
        let other = JobContext::with_id("job2", dir.path());

        let path = job.write_asset("job1_page1_img1.png", b"png").unwrap();
        assert_eq!(path, "images/job1_page1_img1.png");
        assert!(job.resolve(&path).exists());
        other.write_asset("job2_page1_img1.png", b"png").unwrap();

        assert_eq!(job.cleanup().unwrap(), 1);
        assert!(!job.resolve(&path).exists());
        assert!(other.resolve("images/job2_page1_img1.png").exists());
    }
}
