use std::{
    io,
    path::{Path, PathBuf},
};

use getset::Getters;
use tokio::fs;

use crate::{utils, PodstoreError, PodstoreResult};

use super::PublishRepository;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The marker file CernVM-FS uses to declare a nested catalog root.
pub const CATALOG_MARKER_FILENAME: &str = ".cvmfscatalog";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A publish target backed by a plain local directory.
///
/// Repository `repo` lives at `<root>/<repo>`. Symlinks are written relative to their parent
/// directory and catalogs are marked with an empty [`CATALOG_MARKER_FILENAME`] file, so the tree
/// can later be handed to `cvmfs_server ingest` or a template transaction as-is.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct LocalRepository {
    /// The directory holding one subdirectory per repository.
    root: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LocalRepository {
    /// Creates a local repository set rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, repo: &str, relative: &Path) -> PathBuf {
        self.root.join(repo).join(relative)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl PublishRepository for LocalRepository {
    async fn create_symlink(&self, repo: &str, link: &Path, target: &Path) -> PodstoreResult<()> {
        let full = self.resolve(repo, link);
        let relative = utils::relative_symlink_target(link, target);

        async {
            create_parent(&full).await?;
            if fs::symlink_metadata(&full).await.is_ok() {
                fs::remove_file(&full).await?;
            }
            fs::symlink(&relative, &full).await
        }
        .await
        .map_err(|e| PodstoreError::ingestion(link, e))?;

        tracing::debug!("created symlink {} -> {}", full.display(), relative.display());
        Ok(())
    }

    async fn ingest_file(&self, repo: &str, dest: &Path, local_file: &Path) -> PodstoreResult<()> {
        let full = self.resolve(repo, dest);

        async {
            create_parent(&full).await?;
            fs::copy(local_file, &full).await
        }
        .await
        .map_err(|e| PodstoreError::ingestion(dest, e))?;

        tracing::debug!("ingested {} into {}", local_file.display(), full.display());
        Ok(())
    }

    async fn create_catalog(&self, repo: &str, dir: &Path) -> PodstoreResult<()> {
        let full = self.resolve(repo, dir);

        async {
            fs::create_dir_all(&full).await?;
            fs::write(full.join(CATALOG_MARKER_FILENAME), b"").await
        }
        .await
        .map_err(|e| PodstoreError::ingestion(dir, e))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

async fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
