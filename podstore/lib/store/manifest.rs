use oci_spec::image::ImageManifest;

use crate::{
    config::StoreLayout, oci::digest_id, oci::Image, repository::PublishRepository,
    PodstoreResult,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Links `overlay-images/<image id>/manifest.json` to the image's published manifest.
///
/// The manifest itself is expected at `.metadata/<registry>/<repository><reference>/manifest.json`,
/// written by whoever publishes the image's metadata. Only the alias is created here.
pub async fn ingest_image_manifest(
    repository: &dyn PublishRepository,
    layout: &StoreLayout,
    repo: &str,
    image: &Image,
    manifest: &ImageManifest,
) -> PodstoreResult<()> {
    let image_id = digest_id(manifest.config().digest());
    let link = layout.image_manifest_path(image_id);
    let target = layout.canonical_manifest_target(image);

    repository
        .create_symlink(repo, &link, &target)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "error in creating the symlink for manifest.json")
        })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
