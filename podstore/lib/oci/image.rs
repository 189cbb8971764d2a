use std::{fmt, str::FromStr};

use getset::Getters;
use oci_spec::image::Digest;

use crate::PodstoreError;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The tag used when an image reference names none.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// The URL scheme used when an image reference names none.
pub const DEFAULT_IMAGE_SCHEME: &str = "https";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An image to publish, as located in its registry.
///
/// An `Image` does not change during a publish.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Image {
    /// The URL scheme used to reach the registry (`http` or `https`).
    scheme: String,

    /// The registry host, optionally with a port.
    registry: String,

    /// The repository path inside the registry.
    repository: String,

    /// The tag or digest selecting the image.
    reference: ImageReference,

    /// The user to authenticate as, if any.
    user: Option<String>,
}

/// Selects an image inside a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// A mutable tag.
    Tag(String),

    /// An immutable content digest.
    Digest(Digest),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Image {
    /// Creates a new image served over https without credentials.
    pub fn new(
        registry: impl Into<String>,
        repository: impl Into<String>,
        reference: ImageReference,
    ) -> Self {
        Self {
            scheme: DEFAULT_IMAGE_SCHEME.to_string(),
            registry: registry.into(),
            repository: repository.into(),
            reference,
            user: None,
        }
    }

    /// Sets the user to authenticate as.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the URL scheme used to reach the registry.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// The registry API base URL, e.g. `https://registry.example.org/v2/library/alpine`.
    pub fn api_base(&self) -> String {
        format!("{}://{}/v2/{}", self.scheme, self.registry, self.repository)
    }
}

impl ImageReference {
    /// Creates a tag reference.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// The reference as it follows the repository in an image name: `:tag` or `@digest`.
    pub fn suffix(&self) -> String {
        match self {
            Self::Tag(tag) => format!(":{tag}"),
            Self::Digest(digest) => format!("@{digest}"),
        }
    }

    /// The reference as used in registry API paths: the bare tag or the full digest.
    pub fn as_api_reference(&self) -> String {
        match self {
            Self::Tag(tag) => tag.clone(),
            Self::Digest(digest) => digest.to_string(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for Image {
    type Err = PodstoreError;

    /// Parses `[scheme://]registry/repository[:tag|@digest]`.
    ///
    /// The scheme defaults to [`DEFAULT_IMAGE_SCHEME`] and the tag to [`DEFAULT_IMAGE_TAG`].
    /// When both a tag and a digest are given, the digest wins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PodstoreError::ImageReference("input string is empty".into()));
        }

        let (scheme, rest) = match s.split_once("://") {
            Some((scheme, rest)) if scheme == "http" || scheme == "https" => (scheme, rest),
            Some((scheme, _)) => {
                return Err(PodstoreError::ImageReference(format!(
                    "unsupported scheme: {scheme}"
                )))
            }
            None => (DEFAULT_IMAGE_SCHEME, s),
        };

        let (registry, path) = rest
            .split_once('/')
            .filter(|(registry, _)| !registry.is_empty())
            .ok_or_else(|| PodstoreError::ImageReference(format!("missing registry: {s}")))?;

        let (name, reference) = match path.split_once('@') {
            Some((name, digest)) => {
                let digest = digest.parse::<Digest>().map_err(|e| {
                    PodstoreError::ImageReference(format!("invalid digest: {e}"))
                })?;
                (strip_tag(name).0, ImageReference::Digest(digest))
            }
            None => {
                let (name, tag) = strip_tag(path);
                let tag = tag.unwrap_or(DEFAULT_IMAGE_TAG);
                if tag.is_empty() {
                    return Err(PodstoreError::ImageReference(format!("empty tag: {s}")));
                }
                (name, ImageReference::tag(tag))
            }
        };

        if name.is_empty() || name.ends_with('/') {
            return Err(PodstoreError::ImageReference(format!(
                "missing repository: {s}"
            )));
        }

        Ok(Image::new(registry, name, reference).with_scheme(scheme))
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}{}",
            self.scheme,
            self.registry,
            self.repository,
            self.reference.suffix()
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Splits `name[:tag]`, only looking for the colon in the last path segment.
fn strip_tag(path: &str) -> (&str, Option<&str>) {
    let segment_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[segment_start..].rfind(':') {
        Some(i) => {
            let colon = segment_start + i;
            (&path[..colon], Some(&path[colon + 1..]))
        }
        None => (path, None),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
