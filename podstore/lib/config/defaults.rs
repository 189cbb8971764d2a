//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The directory, relative to the repository root, that holds the podman additional image store.
pub const DEFAULT_STORE_ROOT: &str = "podmanStore";

/// The overlay driver directory holding the exploded rootfs of every layer and the link aliases.
pub const DEFAULT_ROOTFS_DIR: &str = "overlay";

/// The directory holding the metadata, config and manifest of every image.
pub const DEFAULT_IMAGE_METADATA_DIR: &str = "overlay-images";

/// The directory holding the metadata of every layer.
pub const DEFAULT_LAYER_METADATA_DIR: &str = "overlay-layers";

/// The directory inside the rootfs dir that holds the short link aliases.
pub const DEFAULT_LINK_DIR: &str = "l";

/// The directory, relative to the repository root, where image manifests are published.
pub const DEFAULT_METADATA_DIR: &str = ".metadata";

/// The directory where CernVM-FS repositories are mounted.
pub const DEFAULT_MOUNT_ROOT: &str = "/cvmfs";

/// The name of the lock file inside the image metadata dir.
pub const IMAGES_LOCK_FILENAME: &str = "images.lock";

/// The name of the lock file inside the layer metadata dir.
pub const LAYERS_LOCK_FILENAME: &str = "layers.lock";

/// The name of the per-image manifest symlink.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// The name of the per-layer rootfs directory in the overlay layout.
pub const DIFF_DIRNAME: &str = "diff";

/// The name of the per-layer file holding the layer's link alias.
pub const LINK_FILENAME: &str = "link";

/// The name of the exploded layer directory under the repository's layer area.
pub const LAYERFS_DIRNAME: &str = "layerfs";

/// Environment variable overriding [`DEFAULT_MOUNT_ROOT`].
pub const MOUNT_ROOT_ENV_VAR: &str = "PODSTORE_MOUNT_ROOT";

/// Environment variable selecting the directory where scratch files are created.
pub const SCRATCH_DIR_ENV_VAR: &str = "PODSTORE_SCRATCH_DIR";

/// Environment variable holding the registry password.
pub const REGISTRY_PASSWORD_ENV_VAR: &str = "PODSTORE_REGISTRY_PASSWORD";
