use crate::{config::StoreLayout, repository::PublishRepository, PodstoreError, PodstoreResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Requests a catalog at each of the store's top-level directories.
///
/// Every directory is attempted, whatever happened to the previous ones. Failures are logged with
/// the directory and collected into [`PodstoreError::CatalogBootstrap`].
pub async fn bootstrap_catalogs(
    repository: &dyn PublishRepository,
    layout: &StoreLayout,
    repo: &str,
) -> PodstoreResult<()> {
    let mut failed = Vec::new();
    for dir in layout.catalog_dirs() {
        match repository.create_catalog(repo, &dir).await {
            Ok(()) => tracing::debug!(directory = %dir.display(), "created catalog"),
            Err(e) => {
                tracing::error!(
                    directory = %dir.display(),
                    error = %e,
                    "impossible to create subcatalog in the directory"
                );
                failed.push(dir);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(PodstoreError::CatalogBootstrap(failed))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
