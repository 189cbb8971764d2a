//! `podstore` publishes container images as a podman additional image store inside CernVM-FS
//! repositories.
//!
//! # Overview
//!
//! Layers that are already exploded inside a repository get wired into the directory layout that
//! podman's overlay storage driver expects. Clients can then mount the repository read-only and
//! run the images without pulling anything. The crate handles:
//! - Nested catalog boundaries at the store's top-level directories
//! - Layer `diff` links pointing at the exploded layer contents
//! - Short link aliases under `overlay/l`
//! - The image configuration blob, downloaded from the registry
//! - The image manifest link and the storage lock files
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//!
//! use podstore::{
//!     config::StoreLayout,
//!     distribution::EnvCredentialProvider,
//!     oci::Image,
//!     repository::CvmfsServerRepository,
//!     store::StoreBuilder,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let builder = StoreBuilder::with_http_registry(
//!         StoreLayout::from_env(),
//!         Arc::new(CvmfsServerRepository::new()),
//!         Arc::new(EnvCredentialProvider::new()),
//!     );
//!
//!     let image: Image = "registry-1.docker.io/library/alpine:3.20".parse()?;
//!     builder
//!         .create_podman_image_store(&image, "unpacked.example.org", Path::new("layers"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Store layout and its defaults
//! - [`distribution`] - Manifests, credentials and registry transport
//! - [`oci`] - Image references and digest-derived names
//! - [`repository`] - Publish targets
//! - [`store`] - The store components and the builder running them
//! - [`utils`] - Path and scratch file helpers

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod config;
pub mod distribution;
pub mod oci;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::*;
