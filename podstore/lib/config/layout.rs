use std::{
    env,
    path::{Path, PathBuf},
};

use getset::Getters;
use typed_builder::TypedBuilder;

use crate::{oci::Image, PodstoreError, PodstoreResult};

use super::{
    DEFAULT_IMAGE_METADATA_DIR, DEFAULT_LAYER_METADATA_DIR, DEFAULT_LINK_DIR, DEFAULT_METADATA_DIR,
    DEFAULT_MOUNT_ROOT, DEFAULT_ROOTFS_DIR, DEFAULT_STORE_ROOT, DIFF_DIRNAME, IMAGES_LOCK_FILENAME,
    LAYERFS_DIRNAME, LAYERS_LOCK_FILENAME, LINK_FILENAME, MANIFEST_FILENAME, MOUNT_ROOT_ENV_VAR,
    SCRATCH_DIR_ENV_VAR,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The layout of a podman additional image store inside a repository.
///
/// The layout is built once and handed to every store component, so the same directory names
/// are used throughout a publish. All paths it produces are relative to the repository root,
/// except for [`StoreLayout::mounted_path`] which resolves against the local mount.
///
/// ```text
/// <root>/<rootfs_dir>/<layer id>/diff              symlink to the exploded layer
/// <root>/<rootfs_dir>/<link_dir>/<link id>         symlink to the diff dir
/// <root>/<rootfs_dir>/<layer id>/link              file holding the link id
/// <root>/<image_metadata_dir>/<image id>/<config>  image configuration blob
/// <root>/<image_metadata_dir>/<image id>/manifest.json
/// <root>/<image_metadata_dir>/images.lock
/// <root>/<layer_metadata_dir>/layers.lock
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, TypedBuilder)]
#[getset(get = "pub with_prefix")]
pub struct StoreLayout {
    /// The store root, relative to the repository root.
    #[builder(default = PathBuf::from(DEFAULT_STORE_ROOT), setter(into))]
    root: PathBuf,

    /// The overlay driver directory name.
    #[builder(default = DEFAULT_ROOTFS_DIR.to_string(), setter(into))]
    rootfs_dir: String,

    /// The image metadata directory name.
    #[builder(default = DEFAULT_IMAGE_METADATA_DIR.to_string(), setter(into))]
    image_metadata_dir: String,

    /// The layer metadata directory name.
    #[builder(default = DEFAULT_LAYER_METADATA_DIR.to_string(), setter(into))]
    layer_metadata_dir: String,

    /// The link alias directory name inside the overlay directory.
    #[builder(default = DEFAULT_LINK_DIR.to_string(), setter(into))]
    link_dir: String,

    /// Where image manifests are published, relative to the repository root.
    #[builder(default = PathBuf::from(DEFAULT_METADATA_DIR), setter(into))]
    metadata_dir: PathBuf,

    /// Where repositories are mounted locally.
    #[builder(default = PathBuf::from(DEFAULT_MOUNT_ROOT), setter(into))]
    mount_root: PathBuf,

    /// Where scratch files are created. Uses the system temp dir when unset.
    #[builder(default, setter(strip_option, into))]
    scratch_dir: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl StoreLayout {
    /// Creates the default layout, letting `PODSTORE_MOUNT_ROOT` and `PODSTORE_SCRATCH_DIR`
    /// override the mount root and scratch directory.
    pub fn from_env() -> Self {
        let mut layout = Self::default();
        if let Some(mount_root) = env::var_os(MOUNT_ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
            layout.mount_root = PathBuf::from(mount_root);
        }

        if let Some(scratch_dir) = env::var_os(SCRATCH_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
            layout.scratch_dir = Some(PathBuf::from(scratch_dir));
        }

        layout
    }

    /// The overlay directory: layer rootfs symlinks, link files and aliases.
    pub fn rootfs_root(&self) -> PathBuf {
        self.root.join(&self.rootfs_dir)
    }

    /// The per-image metadata directory.
    pub fn image_metadata_root(&self) -> PathBuf {
        self.root.join(&self.image_metadata_dir)
    }

    /// The per-layer metadata directory.
    pub fn layer_metadata_root(&self) -> PathBuf {
        self.root.join(&self.layer_metadata_dir)
    }

    /// The top-level directories that get their own catalog, in bootstrap order.
    pub fn catalog_dirs(&self) -> [PathBuf; 4] {
        [
            self.root.clone(),
            self.rootfs_root(),
            self.image_metadata_root(),
            self.layer_metadata_root(),
        ]
    }

    /// `overlay/<layer id>/diff`
    pub fn layer_diff_path(&self, layer_id: &str) -> PathBuf {
        self.rootfs_root().join(layer_id).join(DIFF_DIRNAME)
    }

    /// `<sub_dir>/<first two chars of layer id>/<layer id>/layerfs`
    ///
    /// The two character prefix shards the layer area so no directory grows too large.
    pub fn layer_diff_target(&self, sub_dir: &Path, layer_id: &str) -> PodstoreResult<PathBuf> {
        let shard = layer_id.get(..2).ok_or_else(|| {
            PodstoreError::InvalidDigest(format!("layer id too short to shard: {layer_id:?}"))
        })?;

        Ok(sub_dir.join(shard).join(layer_id).join(LAYERFS_DIRNAME))
    }

    /// `overlay/l/<link id>`
    pub fn link_alias_path(&self, link_id: &str) -> PathBuf {
        self.rootfs_root().join(&self.link_dir).join(link_id)
    }

    /// `overlay/<layer id>/link`
    pub fn layer_link_file(&self, layer_id: &str) -> PathBuf {
        self.rootfs_root().join(layer_id).join(LINK_FILENAME)
    }

    /// `overlay-images/<image id>/<file name>`
    pub fn image_config_path(&self, image_id: &str, file_name: &str) -> PathBuf {
        self.image_metadata_root().join(image_id).join(file_name)
    }

    /// `overlay-images/<image id>/manifest.json`
    pub fn image_manifest_path(&self, image_id: &str) -> PathBuf {
        self.image_metadata_root()
            .join(image_id)
            .join(MANIFEST_FILENAME)
    }

    /// `.metadata/<registry>/<repository><reference>/manifest.json`
    ///
    /// The repository and the reference suffix (`:tag` or `@digest`) are concatenated as-is.
    pub fn canonical_manifest_target(&self, image: &Image) -> PathBuf {
        self.metadata_dir
            .join(image.get_registry())
            .join(format!(
                "{}{}",
                image.get_repository(),
                image.get_reference().suffix()
            ))
            .join(MANIFEST_FILENAME)
    }

    /// `overlay-images/images.lock`
    pub fn images_lock_path(&self) -> PathBuf {
        self.image_metadata_root().join(IMAGES_LOCK_FILENAME)
    }

    /// `overlay-layers/layers.lock`
    pub fn layers_lock_path(&self) -> PathBuf {
        self.layer_metadata_root().join(LAYERS_LOCK_FILENAME)
    }

    /// The mount point of a repository.
    pub fn repository_mount(&self, repo: &str) -> PathBuf {
        self.mount_root.join(repo)
    }

    /// Resolves a repository-relative path against the local mount.
    pub fn mounted_path(&self, repo: &str, relative: impl AsRef<Path>) -> PathBuf {
        self.repository_mount(repo).join(relative)
    }

    /// Strips the repository mount prefix from an absolute path.
    pub fn trim_mount_prefix(&self, repo: &str, absolute: &Path) -> PodstoreResult<PathBuf> {
        let prefix = self.repository_mount(repo);
        absolute
            .strip_prefix(&prefix)
            .map(Path::to_path_buf)
            .map_err(|_| PodstoreError::PathOutsideRepository {
                path: absolute.to_path_buf(),
                prefix,
            })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for StoreLayout {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
