use std::{collections::HashSet, path::Path};

use oci_spec::image::ImageManifest;

use crate::{
    config::StoreLayout, oci::digest_id, repository::PublishRepository, utils, PodstoreResult,
};

use super::generate_link_id;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The link alias issued to a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerLink {
    /// The hex digest of the layer.
    pub layer_id: String,

    /// The alias under `overlay/l/`.
    pub link_id: String,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Points each layer's `diff` dir at its exploded rootfs, in manifest order.
///
/// Layer `<id>` gets `overlay/<id>/diff -> <sub_dir>/<id[..2]>/<id>/layerfs`. The first failure
/// stops the loop; links created before it stay in place.
pub async fn ingest_rootfs_into_podman_store(
    repository: &dyn PublishRepository,
    layout: &StoreLayout,
    repo: &str,
    manifest: &ImageManifest,
    sub_dir: &Path,
) -> PodstoreResult<()> {
    for layer in manifest.layers() {
        let layer_id = digest_id(layer.digest());
        let link = layout.layer_diff_path(layer_id);
        let target = layout.layer_diff_target(sub_dir, layer_id)?;

        repository
            .create_symlink(repo, &link, &target)
            .await
            .inspect_err(|e| {
                tracing::error!(layer = layer_id, error = %e, "error in creating the symlink for the diff dir")
            })?;

        tracing::debug!("linked {} -> {}", link.display(), target.display());
    }

    Ok(())
}

/// Gives each layer a short link alias, in manifest order.
///
/// For every layer this creates `overlay/l/<link id> -> overlay/<id>/diff` and writes the link id
/// to `overlay/<id>/link`. Link ids are unique within one call; they are not checked against
/// aliases already in the store.
pub async fn create_link_dir(
    repository: &dyn PublishRepository,
    layout: &StoreLayout,
    repo: &str,
    manifest: &ImageManifest,
) -> PodstoreResult<Vec<LayerLink>> {
    let mut issued = HashSet::new();
    let mut links = Vec::with_capacity(manifest.layers().len());

    for layer in manifest.layers() {
        let layer_id = digest_id(layer.digest());
        let link_id = loop {
            let candidate = generate_link_id();
            if issued.insert(candidate.clone()) {
                break candidate;
            }
            tracing::debug!("link id {candidate} already issued in this publish, drawing again");
        };

        repository
            .create_symlink(
                repo,
                &layout.link_alias_path(&link_id),
                &layout.layer_diff_path(layer_id),
            )
            .await
            .inspect_err(|e| {
                tracing::error!(layer = layer_id, error = %e, "error in creating the symlink for the link dir")
            })?;

        utils::ingest_bytes(
            repository,
            layout,
            repo,
            &layout.layer_link_file(layer_id),
            "linkfile",
            link_id.as_bytes(),
        )
        .await
        .inspect_err(|e| {
            tracing::error!(layer = layer_id, error = %e, "error in writing the link file")
        })?;

        links.push(LayerLink {
            layer_id: layer_id.to_string(),
            link_id,
        });
    }

    Ok(links)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
