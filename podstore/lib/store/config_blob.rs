use std::path::PathBuf;

use oci_spec::image::{Digest, ImageManifest};
use reqwest::Url;

use crate::{
    config::StoreLayout,
    distribution::{CredentialProvider, RegistryTransport},
    oci::{config_file_name, digest_id, Image},
    repository::PublishRepository,
    utils, PodstoreError, PodstoreResult,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Downloads the image configuration blob and ingests it into the image's metadata dir.
///
/// The blob lands at `overlay-images/<image id>/<name>`, where the name is derived from the
/// config digest by [`config_file_name`]. When no password can be found the download is tried
/// anonymously. Returns the repository path of the ingested file.
pub async fn ingest_config_file(
    repository: &dyn PublishRepository,
    registry: &dyn RegistryTransport,
    credentials: &dyn CredentialProvider,
    layout: &StoreLayout,
    repo: &str,
    image: &Image,
    manifest: &ImageManifest,
) -> PodstoreResult<PathBuf> {
    let config_digest = manifest.config().digest();
    let url = config_blob_url(image, config_digest)?;

    let (user, password) = match credentials.get_password(image).await {
        Ok(password) => (image.get_user().clone().unwrap_or_default(), password),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "unable to get the credential for downloading the configuration blob, trying anonymously"
            );
            (String::new(), String::new())
        }
    };

    let token = registry
        .negotiate_token(url.as_str(), &user, &password)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "unable to retrieve the token for downloading the config file")
        })?;

    let body = registry
        .fetch_blob(url.as_str(), &token)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "unable to download the config file"))?;

    let file_name = config_file_name(config_digest)?;
    let dest = layout.image_config_path(digest_id(config_digest), &file_name);
    utils::ingest_bytes(repository, layout, repo, &dest, "configFile", &body).await?;

    tracing::info!("ingested config {} ({} bytes)", dest.display(), body.len());
    Ok(dest)
}

/// `<scheme>://<registry>/v2/<repository>/blobs/<digest>`
pub fn config_blob_url(image: &Image, digest: &Digest) -> PodstoreResult<Url> {
    let raw = format!("{}/blobs/{digest}", image.api_base());
    Url::parse(&raw).map_err(|e| PodstoreError::InvalidUrl(format!("{raw}: {e}")))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
