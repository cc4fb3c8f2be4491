use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Ephemeral filesystem root owned by exactly one pipeline run.
///
/// Dropping the workspace removes the whole tree recursively, best-effort:
/// removal errors are swallowed so that release can never fail a run which
/// already has an outcome. Drop runs on every path out of the pipeline,
/// including task cancellation.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a fresh, uniquely-named directory under the system temp dir.
    pub fn acquire() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("prgrader-").tempdir()?;
        log::debug!("Acquired workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The fixed subpath the submission gets cloned into.
    pub fn repo_dir(&self) -> PathBuf {
        self.dir.path().join("repo")
    }
}
