use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use getset::Getters;
use tar::{Builder, EntryType, Header};
use tokio::{fs, io::AsyncWriteExt, process::Command};

use crate::{utils, PodstoreError, PodstoreResult};

use super::PublishRepository;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The CernVM-FS server administration binary.
pub const CVMFS_SERVER_BINARY: &str = "cvmfs_server";

/// Permissions of files published into the repository.
const PUBLISHED_FILE_MODE: u32 = 0o644;

/// Permissions of symlinks published into the repository.
const PUBLISHED_SYMLINK_MODE: u32 = 0o777;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A publish target that streams tar archives into `cvmfs_server ingest`.
///
/// Every request becomes one ingestion of a single-entry archive under the parent directory of the
/// requested path. Ingestion opens and publishes its own transaction, so each request is visible
/// to clients once the call returns.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct CvmfsServerRepository {
    /// The `cvmfs_server` executable to run.
    binary: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CvmfsServerRepository {
    /// Uses `cvmfs_server` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary(CVMFS_SERVER_BINARY)
    }

    /// Uses the given `cvmfs_server` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn ingest(
        &self,
        repo: &str,
        base_dir: &Path,
        archive: Vec<u8>,
        catalog: bool,
        context: &Path,
    ) -> PodstoreResult<()> {
        let mut command = Command::new(&self.binary);
        command.arg("ingest");
        if catalog {
            command.arg("--catalog");
        }
        command
            .arg("--tar_file")
            .arg("-")
            .arg("--base_dir")
            .arg(base_dir)
            .arg(repo)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            "running {} ingest for {} in {}",
            self.binary.display(),
            context.display(),
            repo
        );

        let mut child = command
            .spawn()
            .map_err(|e| PodstoreError::ingestion(context, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&archive)
                .await
                .map_err(|e| PodstoreError::ingestion(context, e))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PodstoreError::ingestion(context, e))?;

        if !output.status.success() {
            return Err(PodstoreError::ingestion(
                context,
                format!(
                    "{} ingest exited with {}: {}",
                    self.binary.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for CvmfsServerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PublishRepository for CvmfsServerRepository {
    async fn create_symlink(&self, repo: &str, link: &Path, target: &Path) -> PodstoreResult<()> {
        let (base_dir, name) = split_entry(link)?;
        let relative = utils::relative_symlink_target(link, target);
        let archive =
            symlink_archive(&name, &relative).map_err(|e| PodstoreError::ingestion(link, e))?;

        self.ingest(repo, &base_dir, archive, false, link).await
    }

    async fn ingest_file(&self, repo: &str, dest: &Path, local_file: &Path) -> PodstoreResult<()> {
        let (base_dir, name) = split_entry(dest)?;
        let contents = fs::read(local_file)
            .await
            .map_err(|e| PodstoreError::ingestion(dest, e))?;
        let archive =
            file_archive(&name, &contents).map_err(|e| PodstoreError::ingestion(dest, e))?;

        self.ingest(repo, &base_dir, archive, false, dest).await
    }

    async fn create_catalog(&self, repo: &str, dir: &Path) -> PodstoreResult<()> {
        let archive = Builder::new(Vec::new())
            .into_inner()
            .map_err(|e| PodstoreError::ingestion(dir, e))?;

        self.ingest(repo, dir, archive, true, dir).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Splits a repository path into the ingestion base dir and the archive entry name.
fn split_entry(path: &Path) -> PodstoreResult<(PathBuf, PathBuf)> {
    let name = path
        .file_name()
        .ok_or_else(|| PodstoreError::ingestion(path, "path has no file name"))?;
    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("/"),
    };

    Ok((base_dir, PathBuf::from(name)))
}

fn symlink_archive(name: &Path, target: &Path) -> io::Result<Vec<u8>> {
    let mut builder = Builder::new(Vec::new());
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Symlink);
    header.set_size(0);
    header.set_mode(PUBLISHED_SYMLINK_MODE);
    builder.append_link(&mut header, name, target)?;
    builder.into_inner()
}

fn file_archive(name: &Path, contents: &[u8]) -> io::Result<Vec<u8>> {
    let mut builder = Builder::new(Vec::new());
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(contents.len() as u64);
    header.set_mode(PUBLISHED_FILE_MODE);
    builder.append_data(&mut header, name, contents)?;
    builder.into_inner()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
