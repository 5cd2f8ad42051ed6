// src/mirror/reconcile.rs

//! Artifact reconciliation
//!
//! Brings the local mirror directory in line with the manifest: the fetch
//! phase downloads required artifacts that are not present, and the prune
//! phase (optional) deletes everything the manifest no longer names. Prune
//! runs strictly after the fetch phase so a file downloaded moments ago can
//! never be taken for stale.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::client::MirrorClient;
use super::manifest::RequiredSet;
use super::target::RepositoryTarget;
use crate::error::{Error, Result};

/// Reconcile the mirror directory with the required filename set
pub fn reconcile(
    client: &MirrorClient,
    target: &RepositoryTarget,
    dir: &Path,
    required: &RequiredSet,
    prune: bool,
) -> Result<()> {
    let fetched = fetch_missing(client, target, dir, required)?;
    info!(
        "{}/{}: {fetched} artifacts fetched, {} already present",
        target.repository,
        target.architecture,
        required.len() - fetched
    );

    if prune {
        let removed = prune_stale(target, dir, required)?;
        if removed > 0 {
            info!(
                "{}/{}: {removed} stale entries removed",
                target.repository, target.architecture
            );
        }
    }

    Ok(())
}

/// Download every required artifact that is absent from `dir`
///
/// Presence alone short-circuits the download; sizes and checksums are
/// never consulted, so an artifact truncated by an earlier crash is not
/// re-fetched.
fn fetch_missing(
    client: &MirrorClient,
    target: &RepositoryTarget,
    dir: &Path,
    required: &RequiredSet,
) -> Result<usize> {
    let mut fetched = 0;
    for filename in required {
        let dest = dir.join(filename);
        if dest.exists() {
            debug!("{filename} already present, skipping");
            continue;
        }
        client.fetch(&target.artifact_url(filename), &dest)?;
        fetched += 1;
    }
    Ok(fetched)
}

/// Delete every directory entry the current manifest does not account for
///
/// The database file and the raw archive are always kept. Deletion is
/// unconditional and unrecoverable; each removal is logged by name.
fn prune_stale(target: &RepositoryTarget, dir: &Path, required: &RequiredSet) -> Result<usize> {
    let database_name = target.database_name();
    let archive_name = target.archive_name();

    let entries = fs::read_dir(dir)
        .map_err(|e| Error::FilesystemError(format!("failed to list {}: {e}", dir.display())))?;

    let mut removed = 0;
    for entry in entries {
        let entry = entry
            .map_err(|e| Error::FilesystemError(format!("failed to list {}: {e}", dir.display())))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == database_name || name == archive_name || required.contains(name.as_ref()) {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| {
            Error::FilesystemError(format!("failed to stat {}: {e}", path.display()))
        })?;
        let result = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| {
            Error::FilesystemError(format!("failed to remove {}: {e}", path.display()))
        })?;

        info!("removed stale entry {}", path.display());
        removed += 1;
    }

    Ok(removed)
}
