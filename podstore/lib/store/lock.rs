use std::{io::ErrorKind, path::Path};

use tokio::fs;

use crate::{config::StoreLayout, repository::PublishRepository, utils, PodstoreResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates the empty sentinel file `path` unless the mounted repository already has it.
///
/// Returns whether a file was ingested. The existence check reads the local mount, so two
/// publishers racing on the same repository may both ingest the file.
pub async fn create_lock_file(
    repository: &dyn PublishRepository,
    layout: &StoreLayout,
    repo: &str,
    path: &Path,
) -> PodstoreResult<bool> {
    let lock_path = layout.mounted_path(repo, path);
    match fs::symlink_metadata(&lock_path).await {
        Ok(_) => {
            tracing::debug!("lock file {} already exists", lock_path.display());
            return Ok(false);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let relative = layout.trim_mount_prefix(repo, &lock_path)?;
    utils::ingest_bytes(repository, layout, repo, &relative, "lock", b"").await?;

    tracing::info!("created lock file {}", relative.display());
    Ok(true)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
