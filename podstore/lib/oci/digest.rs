use base64::{engine::general_purpose::STANDARD, Engine};
use oci_spec::image::Digest;

use crate::{PodstoreError, PodstoreResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the hex portion of a content digest, which keys the on-disk slot of a layer (layer id)
/// or an image (image id, from the config digest).
pub fn digest_id(digest: &Digest) -> &str {
    digest.digest()
}

/// Derives the name under which containers-storage expects the configuration blob of an image.
///
/// The blob is stored as "big data" keyed by the full digest string. Keys made only of
/// `[a-z0-9.]` are used as-is, anything else is stored as `=` followed by its base64 encoding,
/// which is always the case for `algorithm:hex` keys.
pub fn config_file_name(digest: &Digest) -> PodstoreResult<String> {
    big_data_file_name(&digest.to_string())
}

fn big_data_file_name(key: &str) -> PodstoreResult<String> {
    if key.is_empty() {
        return Err(PodstoreError::InvalidDigest(
            "cannot derive a file name from an empty key".into(),
        ));
    }

    let plain = key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.');

    if plain {
        Ok(key.to_string())
    } else {
        Ok(format!("={}", STANDARD.encode(key)))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
