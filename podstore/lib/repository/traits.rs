use std::path::Path;

use crate::PodstoreResult;

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The primitives a remote, transactionally published filesystem offers to the store builder.
///
/// All paths are relative to the root of the repository named by `repo`. Implementations decide
/// when the changes become visible; the store builder never commits or aborts a transaction.
#[async_trait::async_trait]
pub trait PublishRepository: Send + Sync {
    /// Creates a symlink at `link` pointing to `target`, replacing any existing entry.
    async fn create_symlink(&self, repo: &str, link: &Path, target: &Path) -> PodstoreResult<()>;

    /// Copies the raw bytes of `local_file` to `dest`.
    async fn ingest_file(&self, repo: &str, dest: &Path, local_file: &Path) -> PodstoreResult<()>;

    /// Makes `dir` the root of its own catalog, creating the directory if needed.
    async fn create_catalog(&self, repo: &str, dir: &Path) -> PodstoreResult<()>;
}
