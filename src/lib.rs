// src/lib.rs

//! pkgmirror
//!
//! Mirror tool for Arch-style binary package repositories. For each
//! configured repository/architecture pair it re-fetches the upstream
//! package database, extracts the manifest of required artifacts, downloads
//! whatever is missing locally, and optionally prunes everything upstream no
//! longer ships.
//!
//! # Architecture
//!
//! - Sequential: targets are processed one at a time, fail-fast
//! - One transfer at a time, paired with a file-size-polling progress watcher
//! - Presence-only reconciliation: no checksums, no resumable transfers

pub mod archive;
mod error;
pub mod mirror;
pub mod progress;

pub use error::{Error, Result};
pub use mirror::{
    ArchiveFormat, MirrorClient, RepositoryTarget, RequiredSet, SyncOptions, Synchronizer,
};
pub use progress::{CliProgress, FileWatcher, ProgressTracker, SilentProgress};
