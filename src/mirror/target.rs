// src/mirror/target.rs

//! Repository target description
//!
//! A target names one repository/architecture pair on one upstream host.
//! Targets are plain immutable data, supplied as a fixed list to the
//! synchronizer; nothing in the engine mutates or persists them.

use std::path::{Path, PathBuf};

/// Compression format of the upstream database archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    TarZst,
}

impl ArchiveFormat {
    /// File extension as it appears in the stored archive name
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// One repository/architecture pair to mirror
///
/// `base_address` is a URL template; the placeholders `$repo` and `$arch`
/// are substituted when building request URLs. Both orderings occur in
/// practice (`.../$repo/$arch` and `.../$arch/$repo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    pub base_address: String,
    pub format: ArchiveFormat,
    pub repository: String,
    pub architecture: String,
}

impl RepositoryTarget {
    pub fn new(
        base_address: impl Into<String>,
        format: ArchiveFormat,
        repository: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            base_address: base_address.into(),
            format,
            repository: repository.into(),
            architecture: architecture.into(),
        }
    }

    /// Base URL with `$repo` and `$arch` substituted
    pub fn base_url(&self) -> String {
        self.base_address
            .replace("$repo", &self.repository)
            .replace("$arch", &self.architecture)
    }

    /// URL of the upstream database archive
    pub fn database_url(&self) -> String {
        format!("{}/{}.db", self.base_url(), self.repository)
    }

    /// URL of one package artifact
    pub fn artifact_url(&self, filename: &str) -> String {
        format!("{}/{filename}", self.base_url())
    }

    /// Fixed database name expected by package tooling (`{repo}.db`)
    pub fn database_name(&self) -> String {
        format!("{}.db", self.repository)
    }

    /// Name under which the raw archive is stored (`{repo}.{format}`)
    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.repository, self.format)
    }

    /// Local mirror directory for this target (`{root}/{repo}/{arch}`)
    pub fn mirror_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.repository).join(&self.architecture)
    }
}
