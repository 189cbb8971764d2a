use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use oci_spec::image::ImageManifest;
use podstore::{
    config::StoreLayout,
    distribution::{CredentialProvider, ManifestSource, RegistryTransport},
    oci::{config_file_name, Image},
    repository::{LocalRepository, CATALOG_MARKER_FILENAME},
    store::{StoreBuilder, LINK_ID_LENGTH},
    PodstoreError, PodstoreResult,
};
use serde_json::json;
use tempfile::{tempdir, TempDir};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const REPO: &str = "unpacked.example.org";

const LAYERS_SUBDIR: &str = "layers";

const CONFIG_BODY: &[u8] = br#"{"architecture":"amd64","os":"linux"}"#;

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_podman_store_publishes_complete_layout() -> anyhow::Result<()> {
    let env = TestEnv::new(&["aa11", "bb22"], "cc33")?;
    let repo_root = env.repo_root();
    let aa = "aa11".repeat(16);
    let bb = "bb22".repeat(16);
    let cc = "cc33".repeat(16);

    env.explode_layer(&aa, "etc/os-release", b"alpine")?;
    env.explode_layer(&bb, "usr/bin/app", b"binary")?;

    env.builder
        .create_podman_image_store(&env.image, REPO, Path::new(LAYERS_SUBDIR))
        .await?;

    // Catalog markers
    for dir in env.layout.catalog_dirs() {
        assert!(
            repo_root.join(&dir).join(CATALOG_MARKER_FILENAME).is_file(),
            "missing catalog marker in {}",
            dir.display()
        );
    }

    // Diff links resolve to the exploded layers
    let aa_diff = repo_root.join(format!("podmanStore/overlay/{aa}/diff"));
    assert_eq!(
        std::fs::read_link(&aa_diff)?,
        PathBuf::from(format!("../../../layers/aa/{aa}/layerfs"))
    );
    assert_eq!(std::fs::read(aa_diff.join("etc/os-release"))?, b"alpine");
    assert_eq!(
        std::fs::read(repo_root.join(format!("podmanStore/overlay/{bb}/diff/usr/bin/app")))?,
        b"binary"
    );

    // Link aliases
    let mut aliases = Vec::new();
    for id in [&aa, &bb] {
        let link_id = std::fs::read_to_string(repo_root.join(format!("podmanStore/overlay/{id}/link")))?;
        assert_eq!(link_id.len(), LINK_ID_LENGTH);
        assert!(link_id
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));

        let alias = repo_root.join("podmanStore/overlay/l").join(&link_id);
        assert_eq!(std::fs::read_link(&alias)?, PathBuf::from(format!("../{id}/diff")));
        aliases.push(link_id);
    }
    assert_ne!(aliases[0], aliases[1]);
    assert_eq!(
        std::fs::read(
            repo_root
                .join("podmanStore/overlay/l")
                .join(&aliases[0])
                .join("etc/os-release")
        )?,
        b"alpine"
    );

    // Configuration blob
    let config_name = config_file_name(&format!("sha256:{cc}").parse()?)?;
    assert!(config_name.starts_with('='));
    assert_eq!(
        std::fs::read(repo_root.join(format!("podmanStore/overlay-images/{cc}/{config_name}")))?,
        CONFIG_BODY
    );

    // Manifest link
    assert_eq!(
        std::fs::read_link(repo_root.join(format!("podmanStore/overlay-images/{cc}/manifest.json")))?,
        PathBuf::from("../../../.metadata/reg.example.org/library/alpine:3.20/manifest.json")
    );

    // Lock files
    for lock in ["podmanStore/overlay-images/images.lock", "podmanStore/overlay-layers/layers.lock"] {
        assert_eq!(std::fs::metadata(repo_root.join(lock))?.len(), 0);
    }

    // Scratch files are gone
    assert_eq!(std::fs::read_dir(env.scratch.path())?.count(), 0);

    // The registry was asked for the config blob once, with the image's credentials
    let negotiations = env.registry.negotiations.lock().unwrap().clone();
    assert_eq!(
        negotiations,
        vec![(
            format!("https://reg.example.org/v2/library/alpine/blobs/sha256:{cc}"),
            "builder".to_string(),
            "hunter2".to_string()
        )]
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_podman_store_republish_keeps_existing_lock_files() -> anyhow::Result<()> {
    let env = TestEnv::new(&["aa11"], "cc33")?;
    let images_lock = env.repo_root().join("podmanStore/overlay-images/images.lock");

    env.builder
        .create_podman_image_store(&env.image, REPO, Path::new(LAYERS_SUBDIR))
        .await?;
    let first = std::fs::metadata(&images_lock)?.modified()?;

    env.builder
        .create_podman_image_store(&env.image, REPO, Path::new(LAYERS_SUBDIR))
        .await?;
    let second = std::fs::metadata(&images_lock)?.modified()?;

    assert_eq!(first, second);
    assert_eq!(
        std::fs::read_dir(env.repo_root().join("podmanStore/overlay/l"))?.count(),
        2,
        "every publish issues fresh link aliases"
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_podman_store_without_manifest_writes_nothing() -> anyhow::Result<()> {
    let mut env = TestEnv::new(&["aa11"], "cc33")?;
    env.builder = StoreBuilder::new(
        env.layout.clone(),
        Arc::new(LocalRepository::new(env.mount.path())),
        Arc::new(FixedManifest(None)),
        env.registry.clone(),
        Arc::new(FixedPassword),
    );

    let result = env
        .builder
        .create_podman_image_store(&env.image, REPO, Path::new(LAYERS_SUBDIR))
        .await;

    assert!(matches!(result, Err(PodstoreError::ManifestUnavailable(_))));
    assert!(!env.repo_root().join("podmanStore").exists());

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Types: Helpers
//--------------------------------------------------------------------------------------------------

struct TestEnv {
    mount: TempDir,
    scratch: TempDir,
    layout: StoreLayout,
    registry: Arc<RecordingRegistry>,
    image: Image,
    builder: StoreBuilder,
}

struct FixedManifest(Option<ImageManifest>);

struct FixedPassword;

#[derive(Default)]
struct RecordingRegistry {
    negotiations: Mutex<Vec<(String, String, String)>>,
}

//--------------------------------------------------------------------------------------------------
// Methods: Helpers
//--------------------------------------------------------------------------------------------------

impl TestEnv {
    /// The mounted repository doubles as the publish target, so lock-file checks see earlier
    /// publishes.
    fn new(layers: &[&str], config: &str) -> anyhow::Result<Self> {
        let mount = tempdir()?;
        let scratch = tempdir()?;
        let layout = StoreLayout::builder()
            .mount_root(mount.path())
            .scratch_dir(scratch.path())
            .build();
        let registry = Arc::new(RecordingRegistry::default());
        let image: Image = "reg.example.org/library/alpine:3.20".parse()?;
        let image = image.with_user("builder");

        let builder = StoreBuilder::new(
            layout.clone(),
            Arc::new(LocalRepository::new(mount.path())),
            Arc::new(FixedManifest(Some(manifest(layers, config)?))),
            registry.clone(),
            Arc::new(FixedPassword),
        );

        Ok(Self {
            mount,
            scratch,
            layout,
            registry,
            image,
            builder,
        })
    }

    fn repo_root(&self) -> PathBuf {
        self.mount.path().join(REPO)
    }

    fn explode_layer(&self, id: &str, file: &str, contents: &[u8]) -> anyhow::Result<()> {
        let path = self
            .repo_root()
            .join(LAYERS_SUBDIR)
            .join(&id[..2])
            .join(id)
            .join("layerfs")
            .join(file);
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations: Helpers
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl ManifestSource for FixedManifest {
    async fn fetch_manifest(&self, image: &Image) -> PodstoreResult<ImageManifest> {
        self.0
            .clone()
            .ok_or_else(|| PodstoreError::ManifestUnavailable(image.to_string()))
    }
}

#[async_trait::async_trait]
impl CredentialProvider for FixedPassword {
    async fn get_password(&self, _image: &Image) -> PodstoreResult<String> {
        Ok("hunter2".to_string())
    }
}

#[async_trait::async_trait]
impl RegistryTransport for RecordingRegistry {
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
        Ok("Bearer integration".to_string())
    }

    async fn fetch_blob(&self, _url: &str, authorization: &str) -> PodstoreResult<Bytes> {
        assert_eq!(authorization, "Bearer integration");
        Ok(Bytes::from_static(CONFIG_BODY))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn manifest(layers: &[&str], config: &str) -> anyhow::Result<ImageManifest> {
    let descriptor = |media_type: &str, fill: &str| {
        json!({
            "mediaType": media_type,
            "digest": format!("sha256:{}", fill.repeat(64 / fill.len())),
            "size": 4096
        })
    };

    Ok(serde_json::from_value(json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": descriptor("application/vnd.oci.image.config.v1+json", config),
        "layers": layers
            .iter()
            .map(|fill| descriptor("application/vnd.oci.image.layer.v1.tar+gzip", fill))
            .collect::<Vec<_>>(),
    }))?)
}
