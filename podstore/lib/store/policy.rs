use std::fmt;

use crate::PodstoreResult;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One step of publishing an image into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStep {
    /// Create catalogs at the store's top-level directories.
    CatalogBootstrap,

    /// Link every layer's diff dir to its exploded rootfs.
    RootfsLinks,

    /// Create the link aliases and link files.
    LinkDir,

    /// Download and ingest the image configuration.
    ConfigBlob,

    /// Link the image manifest.
    ManifestLink,

    /// Create `images.lock`.
    ImagesLock,

    /// Create `layers.lock`.
    LayersLock,
}

/// What a failing step does to the rest of the publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// The publish stops and the error is returned.
    Fatal,

    /// The error is logged and the publish continues.
    BestEffort,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PublishStep {
    /// The steps of a publish, in the order they run.
    pub const SEQUENCE: [PublishStep; 7] = [
        PublishStep::CatalogBootstrap,
        PublishStep::RootfsLinks,
        PublishStep::LinkDir,
        PublishStep::ConfigBlob,
        PublishStep::ManifestLink,
        PublishStep::ImagesLock,
        PublishStep::LayersLock,
    ];

    /// The failure policy of this step.
    ///
    /// Catalogs only bound per-directory metadata cost, so the store is correct without them.
    pub fn policy(self) -> StepPolicy {
        match self {
            PublishStep::CatalogBootstrap => StepPolicy::BestEffort,
            _ => StepPolicy::Fatal,
        }
    }

    /// Applies this step's policy to its outcome.
    ///
    /// Returns `Ok(())` when the publish may continue, otherwise the step's error unchanged.
    pub fn settle(self, result: PodstoreResult<()>) -> PodstoreResult<()> {
        let Err(error) = result else {
            tracing::info!(step = %self, "publish step done");
            return Ok(());
        };

        match self.policy() {
            StepPolicy::BestEffort => {
                tracing::warn!(step = %self, error = %error, "best-effort publish step failed, continuing");
                Ok(())
            }
            StepPolicy::Fatal => {
                tracing::error!(step = %self, error = %error, "publish step failed");
                Err(error)
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::CatalogBootstrap => "catalog bootstrap",
            PublishStep::RootfsLinks => "rootfs links",
            PublishStep::LinkDir => "link dir",
            PublishStep::ConfigBlob => "config blob",
            PublishStep::ManifestLink => "manifest link",
            PublishStep::ImagesLock => "images lock",
            PublishStep::LayersLock => "layers lock",
        };

        write!(f, "{name}")
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
