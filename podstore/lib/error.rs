use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a podstore-related operation.
pub type PodstoreResult<T> = Result<T, PodstoreError>;

/// An error that occurred while building or publishing a podman image store.
#[derive(Debug, Error)]
pub enum PodstoreError {
    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),

    /// An error that occurred during an HTTP request.
    #[error("http request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// An error that occurred while decoding a JSON document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The image manifest could not be retrieved or parsed.
    #[error("manifest unavailable: {0}")]
    ManifestUnavailable(String),

    /// No registry credential could be found for the image.
    #[error("credential unavailable: {0}")]
    CredentialUnavailable(String),

    /// The registry refused to hand out an authorization token.
    #[error("auth token error: {0}")]
    AuthToken(String),

    /// The registry answered with an authentication challenge we do not understand.
    #[error("unsupported authentication challenge: {0}")]
    UnsupportedAuthentication(String),

    /// A local scratch file could not be created, written or removed.
    #[error("scratch file error: {0}")]
    ScratchFile(std::io::Error),

    /// The publish target rejected an ingestion, symlink or catalog request.
    #[error("ingestion into {path} failed: {reason}")]
    Ingestion {
        /// The repository-relative path of the failed request.
        path: PathBuf,

        /// What went wrong.
        reason: String,
    },

    /// One or more catalog boundaries could not be created.
    #[error("catalog bootstrap failed for: {0:?}")]
    CatalogBootstrap(Vec<PathBuf>),

    /// A content digest could not be turned into an identifier or file name.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A registry URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// An image reference string could not be parsed.
    #[error("image reference error: {0}")]
    ImageReference(String),

    /// A path could not be expressed relative to the repository mount.
    #[error("path {path} is not inside {prefix}")]
    PathOutsideRepository {
        /// The offending absolute path.
        path: PathBuf,

        /// The repository mount prefix it was expected under.
        prefix: PathBuf,
    },
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PodstoreError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> PodstoreError {
        PodstoreError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Creates an ingestion error for the given repository-relative path.
    pub fn ingestion(path: impl Into<PathBuf>, reason: impl Display) -> PodstoreError {
        PodstoreError::Ingestion {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `PodstoreResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> PodstoreResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}
