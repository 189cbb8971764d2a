//! Registry-facing collaborators: manifests, credentials and authenticated blob transport.

mod challenge;
mod credentials;
mod http;
mod traits;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use challenge::*;
pub use credentials::*;
pub use http::*;
pub use traits::*;
