//! OCI image identities: references, digests and the names derived from them.

mod digest;
mod image;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use digest::*;
pub use image::*;
pub use oci_spec::image::{Digest, ImageManifest};
