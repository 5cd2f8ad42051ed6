// src/mirror/sync.rs

//! Repository synchronization
//!
//! Drives one full pass per repository target: fetch the database archive,
//! install it under its fixed name, extract it into a scratch directory,
//! read the manifest, reconcile artifacts, clean up. Targets are processed
//! strictly sequentially and the first failure aborts the run.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use super::client::MirrorClient;
use super::manifest;
use super::reconcile;
use super::target::RepositoryTarget;
use crate::archive;
use crate::error::{Error, Result};

/// Behavior toggles for a synchronization run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Delete local entries the upstream manifest no longer names
    pub prune: bool,
}

/// Sequential driver for a set of repository targets
pub struct Synchronizer {
    client: MirrorClient,
    root: PathBuf,
    options: SyncOptions,
}

impl Synchronizer {
    /// Create a synchronizer writing below `root`
    pub fn new(root: impl Into<PathBuf>, options: SyncOptions) -> Result<Self> {
        Ok(Self {
            client: MirrorClient::new()?,
            root: root.into(),
            options,
        })
    }

    /// Synchronize all targets in order, stopping at the first failure
    ///
    /// Targets already synchronized when a later one fails keep their
    /// on-disk state; there is no rollback and no skip-and-continue.
    pub fn sync_all(&self, targets: &[RepositoryTarget]) -> Result<()> {
        for target in targets {
            self.sync(target)?;
        }
        Ok(())
    }

    /// Run one repository/architecture pass
    ///
    /// The database archive is always re-fetched, even when the local copy
    /// is current — there is no conditional GET.
    pub fn sync(&self, target: &RepositoryTarget) -> Result<()> {
        info!(
            "syncing {}/{} from {}",
            target.repository,
            target.architecture,
            target.base_url()
        );

        let dir = target.mirror_dir(&self.root);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::FilesystemError(format!("failed to create {}: {e}", dir.display())))?;

        let archive_path = dir.join(target.archive_name());
        self.client.fetch(&target.database_url(), &archive_path)?;

        // Package tooling expects the fixed {repo}.db name regardless of the
        // archive's actual compression
        let database_path = dir.join(target.database_name());
        fs::copy(&archive_path, &database_path).map_err(|e| {
            Error::FilesystemError(format!(
                "failed to copy {} to {}: {e}",
                archive_path.display(),
                database_path.display()
            ))
        })?;

        let scratch = tempfile::Builder::new()
            .prefix("pkgmirror-")
            .tempdir()
            .map_err(|e| {
                Error::FilesystemError(format!("failed to create scratch directory: {e}"))
            })?;
        archive::extract(&archive_path, scratch.path())?;

        let required = manifest::read_manifest(scratch.path())?;
        debug!(
            "{}/{}: manifest lists {} artifacts",
            target.repository,
            target.architecture,
            required.len()
        );

        reconcile::reconcile(&self.client, target, &dir, &required, self.options.prune)?;

        scratch.close().map_err(|e| {
            Error::FilesystemError(format!("failed to remove scratch directory: {e}"))
        })?;

        info!("{}/{} synchronized", target.repository, target.architecture);
        Ok(())
    }
}
