// src/mirror/manifest.rs

//! Package manifest extraction
//!
//! An extracted database holds one subdirectory per package version, each
//! containing a `desc` record: newline-delimited text where a `%FIELD%`
//! marker line is followed by the field's value. The only field consumed
//! here is `%FILENAME%`, the name of the package artifact.
//!
//! A record without a usable filename — marker absent, marker on the last
//! line, or followed by an empty line — is a fatal [`Error::ProtocolError`].
//! Skipping such records would silently leave packages unmirrored, and an
//! empty filename would resolve to the mirror directory itself.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Marker line preceding the artifact filename in a desc record
const FILENAME_MARKER: &str = "%FILENAME%";

/// Artifact filenames required by one repository/architecture pair
///
/// Ordered, so sync passes and their logs are deterministic.
pub type RequiredSet = BTreeSet<String>;

/// Collect required artifact filenames from an extracted database
///
/// Reads the `desc` record of every immediate subdirectory of `scratch`.
/// Non-directory entries at the top level are ignored; a subdirectory
/// without a readable `desc` is fatal.
pub fn read_manifest(scratch: &Path) -> Result<RequiredSet> {
    let entries = fs::read_dir(scratch).map_err(|e| {
        Error::FilesystemError(format!("failed to list {}: {e}", scratch.display()))
    })?;

    let mut required = RequiredSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::FilesystemError(format!("failed to list {}: {e}", scratch.display()))
        })?;
        let file_type = entry.file_type().map_err(|e| {
            Error::FilesystemError(format!("failed to stat {}: {e}", entry.path().display()))
        })?;
        if !file_type.is_dir() {
            continue;
        }

        let desc_path = entry.path().join("desc");
        let content = fs::read_to_string(&desc_path).map_err(|e| {
            Error::FilesystemError(format!("failed to read {}: {e}", desc_path.display()))
        })?;

        let filename = parse_desc(&content).ok_or_else(|| {
            Error::ProtocolError(format!(
                "{} has no {FILENAME_MARKER} entry",
                desc_path.display()
            ))
        })?;

        debug!("{} requires {filename}", entry.file_name().to_string_lossy());
        required.insert(filename);
    }

    Ok(required)
}

/// Artifact filename from a desc record, if it has a usable one
fn parse_desc(content: &str) -> Option<String> {
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        if line == FILENAME_MARKER {
            return lines
                .next()
                .filter(|value| !value.is_empty())
                .map(str::to_owned);
        }
    }
    None
}
