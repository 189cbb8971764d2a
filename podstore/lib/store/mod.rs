//! Construction of the podman additional image store layout.
//!
//! Each submodule owns one part of the layout and can be invoked on its own. [`StoreBuilder`]
//! runs them in order for one image, following the policy in [`PublishStep::policy`].

mod builder;
mod catalog;
mod config_blob;
mod layer;
mod link_id;
mod lock;
mod manifest;
mod policy;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use builder::*;
pub use catalog::*;
pub use config_blob::*;
pub use layer::*;
pub use link_id::*;
pub use lock::*;
pub use manifest::*;
pub use policy::*;

//--------------------------------------------------------------------------------------------------
// Test Fixtures
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Mutex;

    use bytes::Bytes;
    use oci_spec::image::{Digest, ImageManifest};
    use serde_json::json;

    use crate::{
        distribution::{CredentialProvider, ManifestSource, RegistryTransport},
        oci::{Image, ImageReference},
        PodstoreError, PodstoreResult,
    };

    pub const CONFIG_BODY: &[u8] = br#"{"architecture":"amd64","os":"linux","rootfs":{"type":"layers","diff_ids":[]}}"#;

    pub fn sha256(fill: &str) -> String {
        format!("sha256:{}", fill.repeat(64 / fill.len()))
    }

    pub fn digest(fill: &str) -> Digest {
        sha256(fill).parse().expect("valid digest")
    }

    pub fn manifest(layers: &[&str], config: &str) -> ImageManifest {
        let descriptor = |media_type: &str, fill: &str| {
            json!({ "mediaType": media_type, "digest": sha256(fill), "size": 1024 })
        };

        serde_json::from_value(json!({
            "schemaVersion": 2,
            "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
            "config": descriptor("application/vnd.docker.container.image.v1+json", config),
            "layers": layers
                .iter()
                .map(|fill| descriptor("application/vnd.docker.image.rootfs.diff.tar.gzip", fill))
                .collect::<Vec<_>>(),
        }))
        .expect("valid manifest")
    }

    pub fn image() -> Image {
        Image::new("reg.example.org", "library/alpine", ImageReference::tag("latest"))
            .with_user("builder")
    }

    /// Hands out a fixed password, or fails when there is none.
    pub struct StaticCredentials(pub Option<String>);

    #[async_trait::async_trait]
    impl CredentialProvider for StaticCredentials {
        async fn get_password(&self, _image: &Image) -> PodstoreResult<String> {
            self.0
                .clone()
                .ok_or_else(|| PodstoreError::CredentialUnavailable("no password".into()))
        }
    }

    /// Serves a fixed manifest, or fails when there is none.
    pub struct StaticManifest(pub Option<ImageManifest>);

    #[async_trait::async_trait]
    impl ManifestSource for StaticManifest {
        async fn fetch_manifest(&self, image: &Image) -> PodstoreResult<ImageManifest> {
            self.0
                .clone()
                .ok_or_else(|| PodstoreError::ManifestUnavailable(image.to_string()))
        }
    }

    /// A registry that records token negotiations and blob downloads.
    #[derive(Default)]
    pub struct MockRegistry {
        pub fail_token: bool,
        pub fail_fetch: bool,
        pub negotiations: Mutex<Vec<(String, String, String)>>,
        pub fetches: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl RegistryTransport for MockRegistry {
        async fn negotiate_token(
            &self,
            url: &str,
            user: &str,
            password: &str,
        ) -> PodstoreResult<String> {
            self.negotiations.lock().unwrap().push((
                url.to_string(),
                user.to_string(),
                password.to_string(),
            ));
            if self.fail_token {
                return Err(PodstoreError::AuthToken("denied".into()));
            }

            Ok("Bearer test-token".to_string())
        }

        async fn fetch_blob(&self, url: &str, authorization: &str) -> PodstoreResult<Bytes> {
            self.fetches
                .lock()
                .unwrap()
                .push((url.to_string(), authorization.to_string()));
            if self.fail_fetch {
                return Err(PodstoreError::custom(anyhow::anyhow!("connection reset")));
            }

            Ok(Bytes::from_static(CONFIG_BODY))
        }
    }
}
