//! Filesystem content store: one directory, one file per filename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::content_digest;
use crate::error::{ErrorCode, RegwatchError, RegwatchResult};
use crate::traits::{ContentStore, SaveOutcome};
use crate::types::base_filename;

/// Stores raw documents as files under a single directory.
///
/// The directory is created on first save. Writes go to a temporary file
/// that is renamed over the target, so readers never observe a partially
/// written document. Concurrent writers to the same filename are not
/// ordered; the last rename wins.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path for a filename.
    pub fn path_for(&self, filename: &str) -> RegwatchResult<PathBuf> {
        let name = base_filename(filename);
        if name.trim().is_empty() || name == "." || name == ".." {
            return Err(RegwatchError::invalid_key(filename));
        }
        Ok(self.root.join(name))
    }

    async fn read_existing(&self, path: &Path) -> RegwatchResult<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegwatchError::persist_io(
                format!("failed to read {}", path.display()),
                ErrorCode::PerReadFailed,
                e,
            )),
        }
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> RegwatchResult<()> {
        let write_err = |what: String, e: std::io::Error| {
            RegwatchError::persist_io(what, ErrorCode::PerWriteFailed, e)
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| write_err(format!("failed to create {}", self.root.display()), e))?;

        // Short fixed-length name so filenames near the OS limit still fit.
        let tmp = self.root.join(format!(
            ".{}.{}.tmp",
            &content_digest(bytes)[..16],
            std::process::id()
        ));

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| write_err(format!("failed to write {}", tmp.display()), e))?;

        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(format!("failed to move into {}", path.display()), e));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn save(&self, filename: &str, bytes: &[u8]) -> RegwatchResult<SaveOutcome> {
        let path = self.path_for(filename)?;

        let outcome = match self.read_existing(&path).await? {
            Some(existing) if existing == bytes => {
                debug!(filename, path = %path.display(), "Identical content already stored");
                return Ok(SaveOutcome::Unchanged);
            }
            Some(existing) => {
                warn!(
                    filename,
                    previous_sha256 = %content_digest(&existing),
                    new_sha256 = %content_digest(bytes),
                    "Different document stored under the same filename, overwriting"
                );
                SaveOutcome::Overwritten
            }
            None => SaveOutcome::Created,
        };

        self.write_atomic(&path, bytes).await?;
        info!(
            filename,
            path = %path.display(),
            size = bytes.len(),
            outcome = %outcome,
            "Saved regulation"
        );
        Ok(outcome)
    }

    async fn load(&self, filename: &str) -> RegwatchResult<Vec<u8>> {
        let path = self.path_for(filename)?;
        tokio::fs::read(&path).await.map_err(|e| {
            RegwatchError::persist_io(
                format!("failed to read {}", path.display()),
                ErrorCode::PerReadFailed,
                e,
            )
        })
    }

    async fn exists(&self, filename: &str) -> RegwatchResult<bool> {
        let path = self.path_for(filename)?;
        Ok(self.read_existing(&path).await?.is_some())
    }
}
