//! File persistence under the data root.
//!
//! The directory layout (data root plus one subdirectory per mode) is created
//! once at startup by [`FileStore::ensure_layout`]. Per-request writes never
//! create directories; a missing directory surfaces as a persistence error.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{SynapsisError, SynapsisResult};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data root. Also the working directory for publishing.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the data root and each given subdirectory if missing.
    pub fn ensure_layout<'a>(&self, subdirs: impl IntoIterator<Item = &'a str>) -> Result<()> {
        std::fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create data directory: {}", self.root.display())
        })?;

        for subdir in subdirs {
            let dir = self.root.join(subdir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create mode directory: {}", dir.display()))?;
            debug!(dir = %dir.display(), "mode directory ready");
        }

        info!(root = %self.root.display(), "data directory ready");
        Ok(())
    }

    /// `root / subdir / filename`, or `root / filename` without a subdir.
    pub fn resolve(&self, subdir: Option<&str>, filename: &str) -> PathBuf {
        match subdir.filter(|s| !s.is_empty()) {
            Some(s) => self.root.join(s).join(filename),
            None => self.root.join(filename),
        }
    }

    /// Write `content` as UTF-8, replacing any existing file.
    pub async fn save(
        &self,
        subdir: Option<&str>,
        filename: &str,
        content: &str,
    ) -> SynapsisResult<PathBuf> {
        let path = self.resolve(subdir, filename);

        tokio::fs::write(&path, content.as_bytes())
            .await
            .map_err(|source| SynapsisError::Persistence {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), bytes = content.len(), "saved file");
        Ok(path)
    }
}
