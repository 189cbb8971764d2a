//! Publish targets: where the store layout gets written.
//!
//! The store components only talk to a [`PublishRepository`]. Three implementations ship with the
//! crate:
//! - [`CvmfsServerRepository`] ingests into a CernVM-FS repository, one
//!   `cvmfs_server ingest` transaction per request
//! - [`LocalRepository`] writes into a plain directory tree
//! - [`MemoryRepository`] records requests, for dry runs and tests

mod cvmfs;
mod local;
mod memory;
mod traits;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use cvmfs::*;
pub use local::*;
pub use memory::*;
pub use traits::*;
