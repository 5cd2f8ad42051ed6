// src/mirror/mod.rs

//! Repository mirroring engine
//!
//! This module provides functionality for:
//! - Describing repository/architecture targets
//! - Fetching database archives and package artifacts over HTTP
//! - Extracting required artifact names from package manifests
//! - Reconciling the local mirror directory against the manifest

mod client;
mod manifest;
mod reconcile;
mod sync;
mod target;

// Re-export main types and functions
pub use client::MirrorClient;
pub use manifest::{read_manifest, RequiredSet};
pub use reconcile::reconcile;
pub use sync::{SyncOptions, Synchronizer};
pub use target::{ArchiveFormat, RepositoryTarget};
