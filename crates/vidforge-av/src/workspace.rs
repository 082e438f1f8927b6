//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;
use vidforge_common::{Operation, Result};

use crate::package::Deliverable;
use crate::transcode::TranscodeJob;

/// A uniquely named temporary directory holding one job's upload and output.
///
/// The directory and everything in it is removed when the workspace is
/// dropped, so every exit path (success, engine failure, cancelled request)
/// cleans up.
///
/// # Example
///
/// ```no_run
/// use vidforge_av::JobWorkspace;
///
/// let ws = JobWorkspace::new(None)?;
/// std::fs::write(ws.input_path(), b"...")?;
/// // ... run the job, stream the deliverable ...
/// ws.cleanup();
/// # Ok::<(), vidforge_common::Error>(())
/// ```
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
    input: PathBuf,
}

impl JobWorkspace {
    /// Create a workspace under `base`, or the system temp dir.
    pub fn new(base: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vidforge-");
        let dir = match base {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        let input = dir.path().join(format!("in-{}", Uuid::new_v4().simple()));
        tracing::debug!("Created job workspace {}", dir.path().display());
        Ok(Self { dir, input })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the uploaded source is stored.
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// A job reading this workspace's input and writing into it.
    pub fn job(&self, operations: Vec<Operation>) -> TranscodeJob {
        TranscodeJob {
            input: self.input.clone(),
            operations,
            work_dir: self.path().to_path_buf(),
        }
    }

    /// Move a deliverable out of the workspace before it is removed.
    ///
    /// Falls back to copy-and-delete when `dest` is on another filesystem.
    pub fn persist(&self, deliverable: &Deliverable, dest: &Path) -> Result<PathBuf> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if std::fs::rename(&deliverable.path, dest).is_err() {
            std::fs::copy(&deliverable.path, dest)?;
            std::fs::remove_file(&deliverable.path)?;
        }
        Ok(dest.to_path_buf())
    }

    /// Remove the workspace now.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!("Failed to remove workspace {}: {e}", path.display());
        }
    }
}
