// src/main.rs

use anyhow::Result;
use pkgmirror::{ArchiveFormat, RepositoryTarget, SyncOptions, Synchronizer};
use tracing::info;

/// Repositories to mirror, processed in order
fn targets() -> Vec<RepositoryTarget> {
    let mut targets = Vec::new();

    for repo in ["danctnix", "phosh", "pine64"] {
        targets.push(RepositoryTarget::new(
            "https://p64.arikawa-hi.me/$repo/$arch",
            ArchiveFormat::TarXz,
            repo,
            "aarch64",
        ));
    }

    targets.push(RepositoryTarget::new(
        "https://repo.lohl1kohl.de/$repo/$arch",
        ArchiveFormat::TarXz,
        "beryllium",
        "aarch64",
    ));

    targets.push(RepositoryTarget::new(
        "https://ftp.halifax.rwth-aachen.de/manjaro/arm-unstable/$repo/$arch",
        ArchiveFormat::TarGz,
        "mobile",
        "aarch64",
    ));

    for repo in ["alarm", "aur", "community", "core", "extra"] {
        targets.push(RepositoryTarget::new(
            "https://ftp.halifax.rwth-aachen.de/archlinux-arm/$arch/$repo",
            ArchiveFormat::TarGz,
            repo,
            "aarch64",
        ));
    }

    targets
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let targets = targets();
    let synchronizer = Synchronizer::new("mirror", SyncOptions { prune: true })?;
    synchronizer.sync_all(&targets)?;

    info!("all {} targets synchronized", targets.len());
    Ok(())
}
