// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::errors::BenchError;

/// Every workspace directory starts with this, so leftovers from a
/// killed run are easy to spot and remove.
pub const WORKSPACE_PREFIX: &str = ".ds-test";

/// Disposable directory hosting one on-disk backend for one run.
///
/// The directory is removed by `release`, or by `Drop` on any other
/// exit path (early return, `?`, panic).
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a fresh workspace. With `memory_backed` it lives on a
    /// memory-resident filesystem, which takes the disk out of the
    /// measurement; otherwise it lives in the working directory.
    pub fn acquire(memory_backed: bool) -> Result<Self, BenchError> {
        let base = if memory_backed {
            memory_backed_root()
        } else {
            std::env::current_dir().map_err(|source| BenchError::Workspace {
                path: PathBuf::from("."),
                source,
            })?
        };
        Self::acquire_in(&base)
    }

    pub fn acquire_in(base: &Path) -> Result<Self, BenchError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(base)
            .map_err(|source| BenchError::Workspace {
                path: base.to_path_buf(),
                source,
            })?;
        debug!("acquired workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Recursively deletes the workspace, reporting failures that the
    /// `Drop` path would have to swallow.
    pub fn release(self) -> Result<(), BenchError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| BenchError::Workspace {
                path: path.clone(),
                source,
            })?;
        debug!("released workspace {}", path.display());
        Ok(())
    }
}

/// Where memory-backed workspaces go: the per-user runtime directory
/// (a tmpfs on systemd hosts), then `/dev/shm`, then the system
/// temporary directory.
pub fn memory_backed_root() -> PathBuf {
    if let Some(dir) = dirs_next::runtime_dir().filter(|dir| dir.is_dir()) {
        return dir;
    }
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        return shm.to_path_buf();
    }
    std::env::temp_dir()
}
