use bytes::Bytes;
use oci_spec::image::ImageManifest;

use crate::{oci::Image, PodstoreResult};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Retrieves the manifest of an image.
#[async_trait::async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetches and parses the manifest of `image`.
    ///
    /// Failures are reported as [`crate::PodstoreError::ManifestUnavailable`].
    async fn fetch_manifest(&self, image: &Image) -> PodstoreResult<ImageManifest>;
}

/// Looks up the secret used to authenticate against an image's registry.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the password for the image's user.
    async fn get_password(&self, image: &Image) -> PodstoreResult<String>;
}

/// Authenticated access to registry blobs.
#[async_trait::async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Negotiates the `Authorization` header value needed to GET `url`.
    ///
    /// Returns an empty string when the registry serves `url` without authentication. Empty
    /// `user` and `password` mean anonymous access.
    async fn negotiate_token(&self, url: &str, user: &str, password: &str)
        -> PodstoreResult<String>;

    /// Downloads the whole body of `url`, sending `authorization` when it is not empty.
    async fn fetch_blob(&self, url: &str, authorization: &str) -> PodstoreResult<Bytes>;
}
