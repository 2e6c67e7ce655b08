//! Per-execution scratch directories
//!
//! Every execution gets its own directory under the configured workspace root.
//! The directory is removed by [`Workspace::close`], and by `Drop` if the owner
//! never got that far (cancelled future, panic).

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// An isolated, uniquely named directory owned by one execution
#[derive(Debug)]
pub struct Workspace {
    id: String,
    root: PathBuf,
    files: Vec<PathBuf>,
    disposed: bool,
}

impl Workspace {
    /// Create a fresh directory under `base`
    pub async fn open(base: &Path) -> Result<Self> {
        let id = format!(
            "run-{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3fZ"),
            Uuid::new_v4().simple()
        );
        let root = base.join(&id);

        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::Workspace(format!("failed to create {}: {}", root.display(), e))
        })?;

        debug!(workspace = %id, path = %root.display(), "Opened workspace");

        Ok(Self {
            id,
            root,
            files: Vec::new(),
            disposed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Workspace directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Files written so far, in creation order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Write `contents` to a plain file name inside the workspace
    pub async fn write_file(&mut self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        if self.disposed {
            return Err(Error::Workspace(format!("workspace {} is already closed", self.id)));
        }
        let path = self.child(name)?;

        tokio::fs::write(&path, contents.as_ref()).await.map_err(|e| {
            Error::Workspace(format!("failed to write {}: {}", path.display(), e))
        })?;

        self.files.push(path.clone());
        Ok(path)
    }

    /// Path for a build product; nothing is created
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        self.child(name)
    }

    fn child(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(Error::InvalidInput(format!(
                "'{}' is not a plain file name",
                name
            ))),
        }
    }

    /// Remove the directory and everything in it
    ///
    /// Idempotent. Removal failures are logged, never returned.
    pub async fn close(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!(workspace = %self.id, "Removed workspace"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                workspace = %self.id,
                path = %self.root.display(),
                error = %e,
                "Failed to remove workspace"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(workspace = %self.id, "Removed workspace on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                workspace = %self.id,
                path = %self.root.display(),
                error = %e,
                "Failed to remove workspace on drop"
            ),
        }
    }
}
