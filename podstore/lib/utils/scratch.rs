use std::path::Path;

use tempfile::{Builder, TempPath};
use tokio::fs;

use crate::{config::StoreLayout, repository::PublishRepository, PodstoreError, PodstoreResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A local file that only lives long enough to be ingested into a repository.
///
/// The file is removed by [`ScratchFile::remove`], or on drop if that is never reached.
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ScratchFile {
    /// Creates a scratch file holding `contents`.
    ///
    /// The file is created in `scratch_dir`, or the system temp dir when `None`.
    pub async fn create(
        scratch_dir: Option<&Path>,
        prefix: &str,
        contents: &[u8],
    ) -> PodstoreResult<Self> {
        let mut builder = Builder::new();
        builder.prefix(prefix);

        let file = match scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(PodstoreError::ScratchFile)?;

        // Close our handle, the ingestion reads the file by path.
        let path = file.into_temp_path();
        if !contents.is_empty() {
            fs::write(&path, contents)
                .await
                .map_err(PodstoreError::ScratchFile)?;
        }

        Ok(Self { path })
    }

    /// The location of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the scratch file.
    pub fn remove(self) -> PodstoreResult<()> {
        self.path.close().map_err(PodstoreError::ScratchFile)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Writes `contents` to a scratch file, ingests it at `dest` and deletes the scratch file.
///
/// The scratch file is deleted whether or not the ingestion succeeded. An ingestion error takes
/// precedence over an error deleting the scratch file.
pub async fn ingest_bytes(
    repository: &dyn PublishRepository,
    layout: &StoreLayout,
    repo: &str,
    dest: &Path,
    prefix: &str,
    contents: &[u8],
) -> PodstoreResult<()> {
    let scratch = ScratchFile::create(layout.get_scratch_dir().as_deref(), prefix, contents).await?;
    let ingested = repository.ingest_file(repo, dest, scratch.path()).await;
    let removed = scratch.remove();

    ingested?;
    removed
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
