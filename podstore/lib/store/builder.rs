use std::{path::Path, sync::Arc};

use getset::Getters;
use oci_spec::image::ImageManifest;

use crate::{
    config::StoreLayout,
    distribution::{CredentialProvider, HttpRegistryClient, ManifestSource, RegistryTransport},
    oci::Image,
    repository::PublishRepository,
    PodstoreResult,
};

use super::{
    bootstrap_catalogs, create_link_dir, create_lock_file, ingest_config_file,
    ingest_image_manifest, ingest_rootfs_into_podman_store, PublishStep,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Publishes images into a podman additional image store.
///
/// One call to [`StoreBuilder::create_podman_image_store`] publishes one image: it fetches the
/// manifest once and then runs every [`PublishStep`] in order. Artifacts written before a fatal
/// failure are left in place; they are not rolled back.
///
/// ## Example
///
/// ```rust,no_run
/// use std::{path::Path, sync::Arc};
///
/// use podstore::{
///     config::StoreLayout,
///     distribution::EnvCredentialProvider,
///     repository::CvmfsServerRepository,
///     store::StoreBuilder,
/// };
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let builder = StoreBuilder::with_http_registry(
///         StoreLayout::from_env(),
///         Arc::new(CvmfsServerRepository::new()),
///         Arc::new(EnvCredentialProvider::new()),
///     );
///
///     let image = "https://registry-1.docker.io/library/alpine:latest".parse()?;
///     builder
///         .create_podman_image_store(&image, "unpacked.example.org", Path::new("layers"))
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct StoreBuilder {
    /// The store layout shared by every step.
    layout: StoreLayout,

    /// Where the layout gets written.
    repository: Arc<dyn PublishRepository>,

    /// Where manifests come from.
    manifests: Arc<dyn ManifestSource>,

    /// How the configuration blob is downloaded.
    registry: Arc<dyn RegistryTransport>,

    /// Where registry passwords come from.
    credentials: Arc<dyn CredentialProvider>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl StoreBuilder {
    /// Creates a store builder from its collaborators.
    pub fn new(
        layout: StoreLayout,
        repository: Arc<dyn PublishRepository>,
        manifests: Arc<dyn ManifestSource>,
        registry: Arc<dyn RegistryTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            layout,
            repository,
            manifests,
            registry,
            credentials,
        }
    }

    /// Creates a store builder that talks to registries over HTTP.
    pub fn with_http_registry(
        layout: StoreLayout,
        repository: Arc<dyn PublishRepository>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let client = Arc::new(HttpRegistryClient::new(credentials.clone()));
        Self::new(layout, repository, client.clone(), client, credentials)
    }

    /// Publishes `image` into repository `repo`.
    ///
    /// `sub_dir` is where the repository keeps exploded layers, sharded as
    /// `<sub_dir>/<id[..2]>/<id>/layerfs`.
    pub async fn create_podman_image_store(
        &self,
        image: &Image,
        repo: &str,
        sub_dir: &Path,
    ) -> PodstoreResult<()> {
        tracing::info!("publishing {image} into podman store of {repo}");

        let manifest = self
            .manifests
            .fetch_manifest(image)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "error in getting the image manifest"))?;

        for step in PublishStep::SEQUENCE {
            let result = self.run_step(step, image, &manifest, repo, sub_dir).await;
            step.settle(result)?;
        }

        tracing::info!("published {image} into podman store of {repo}");
        Ok(())
    }

    async fn run_step(
        &self,
        step: PublishStep,
        image: &Image,
        manifest: &ImageManifest,
        repo: &str,
        sub_dir: &Path,
    ) -> PodstoreResult<()> {
        let repository = self.repository.as_ref();
        let layout = &self.layout;

        match step {
            PublishStep::CatalogBootstrap => bootstrap_catalogs(repository, layout, repo).await,
            PublishStep::RootfsLinks => {
                ingest_rootfs_into_podman_store(repository, layout, repo, manifest, sub_dir).await
            }
            PublishStep::LinkDir => create_link_dir(repository, layout, repo, manifest)
                .await
                .map(|_| ()),
            PublishStep::ConfigBlob => ingest_config_file(
                repository,
                self.registry.as_ref(),
                self.credentials.as_ref(),
                layout,
                repo,
                image,
                manifest,
            )
            .await
            .map(|_| ()),
            PublishStep::ManifestLink => {
                ingest_image_manifest(repository, layout, repo, image, manifest).await
            }
            PublishStep::ImagesLock => {
                create_lock_file(repository, layout, repo, &layout.images_lock_path())
                    .await
                    .map(|_| ())
            }
            PublishStep::LayersLock => {
                create_lock_file(repository, layout, repo, &layout.layers_lock_path())
                    .await
                    .map(|_| ())
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
