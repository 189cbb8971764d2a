use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use tokio::fs;

use crate::{PodstoreError, PodstoreResult};

use super::PublishRepository;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A publish target that only records what it was asked to do.
///
/// Ingested files are read eagerly so their bytes can be inspected after the local scratch file is
/// gone. Individual paths can be made to fail with [`MemoryRepository::fail_on`].
#[derive(Debug, Default)]
pub struct MemoryRepository {
    operations: Mutex<Vec<RepositoryOp>>,
    failing: Mutex<HashSet<PathBuf>>,
}

/// A request received by a [`MemoryRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOp {
    /// A symlink creation.
    Symlink {
        /// The repository name.
        repo: String,

        /// Where the symlink was created.
        link: PathBuf,

        /// What the symlink points to.
        target: PathBuf,
    },

    /// A file ingestion.
    Ingest {
        /// The repository name.
        repo: String,

        /// Where the file was ingested.
        path: PathBuf,

        /// The bytes of the ingested file.
        contents: Vec<u8>,
    },

    /// A catalog creation.
    Catalog {
        /// The repository name.
        repo: String,

        /// The catalog root.
        dir: PathBuf,
    },
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MemoryRepository {
    /// Creates an empty recording repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later request targeting `path` fail with an ingestion error.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        lock(&self.failing).insert(path.into());
    }

    /// All recorded requests, in the order they were received.
    pub fn operations(&self) -> Vec<RepositoryOp> {
        lock(&self.operations).clone()
    }

    /// The recorded symlinks as `(link, target)` pairs.
    pub fn symlinks(&self) -> Vec<(PathBuf, PathBuf)> {
        lock(&self.operations)
            .iter()
            .filter_map(|op| match op {
                RepositoryOp::Symlink { link, target, .. } => Some((link.clone(), target.clone())),
                _ => None,
            })
            .collect()
    }

    /// The recorded ingestions as `(path, contents)` pairs.
    pub fn ingested(&self) -> Vec<(PathBuf, Vec<u8>)> {
        lock(&self.operations)
            .iter()
            .filter_map(|op| match op {
                RepositoryOp::Ingest { path, contents, .. } => {
                    Some((path.clone(), contents.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// The recorded catalog roots.
    pub fn catalogs(&self) -> Vec<PathBuf> {
        lock(&self.operations)
            .iter()
            .filter_map(|op| match op {
                RepositoryOp::Catalog { dir, .. } => Some(dir.clone()),
                _ => None,
            })
            .collect()
    }

    fn check(&self, path: &Path) -> PodstoreResult<()> {
        if lock(&self.failing).contains(path) {
            return Err(PodstoreError::ingestion(path, "injected failure"));
        }

        Ok(())
    }

    fn record(&self, op: RepositoryOp) {
        lock(&self.operations).push(op);
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl PublishRepository for MemoryRepository {
    async fn create_symlink(&self, repo: &str, link: &Path, target: &Path) -> PodstoreResult<()> {
        self.check(link)?;
        self.record(RepositoryOp::Symlink {
            repo: repo.to_string(),
            link: link.to_path_buf(),
            target: target.to_path_buf(),
        });

        Ok(())
    }

    async fn ingest_file(&self, repo: &str, dest: &Path, local_file: &Path) -> PodstoreResult<()> {
        self.check(dest)?;
        let contents = fs::read(local_file)
            .await
            .map_err(|e| PodstoreError::ingestion(dest, e))?;
        self.record(RepositoryOp::Ingest {
            repo: repo.to_string(),
            path: dest.to_path_buf(),
            contents,
        });

        Ok(())
    }

    async fn create_catalog(&self, repo: &str, dir: &Path) -> PodstoreResult<()> {
        self.check(dir)?;
        self.record(RepositoryOp::Catalog {
            repo: repo.to_string(),
            dir: dir.to_path_buf(),
        });

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
