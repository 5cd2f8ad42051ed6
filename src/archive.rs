// src/archive.rs

//! Database archive extraction
//!
//! Repository databases arrive as compressed tarballs (gzip, xz, or zstd).
//! The compression is detected from magic bytes rather than the advertised
//! extension, since mirrors occasionally mislabel their databases.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;

use crate::error::{Error, Result};

/// Compression applied to a database tarball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    /// Identify compression from the first bytes of the archive
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - XZ: `fd 37 7a 58 5a 00`
    /// - Zstd: `28 b5 2f fd`
    fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
            Some(Self::Gzip)
        } else if data.len() >= 6 && data[..6] == [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00] {
            Some(Self::Xz)
        } else if data.len() >= 4 && data[..4] == [0x28, 0xb5, 0x2f, 0xfd] {
            Some(Self::Zstd)
        } else {
            None
        }
    }
}

/// Extract a compressed database tarball into `dest`
///
/// `dest` must already exist. Entries are unpacked with their relative
/// layout preserved: one subdirectory per package version, each holding its
/// metadata files.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let mut file = File::open(archive)
        .map_err(|e| Error::FilesystemError(format!("failed to open {}: {e}", archive.display())))?;

    let mut magic = [0u8; 6];
    file.read_exact(&mut magic).map_err(|_| {
        Error::ArchiveError(format!(
            "{} is too short to be a database archive",
            archive.display()
        ))
    })?;
    file.rewind()
        .map_err(|e| Error::FilesystemError(format!("failed to rewind {}: {e}", archive.display())))?;

    let compression = Compression::from_magic_bytes(&magic).ok_or_else(|| {
        Error::ArchiveError(format!(
            "unrecognized compression in {}",
            archive.display()
        ))
    })?;

    let reader: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(GzDecoder::new(file)),
        Compression::Xz => Box::new(XzDecoder::new(file)),
        Compression::Zstd => {
            let decoder = zstd::Decoder::new(file).map_err(|e| {
                Error::ArchiveError(format!("failed to create zstd decoder: {e}"))
            })?;
            Box::new(decoder)
        }
    };

    Archive::new(reader).unpack(dest).map_err(|e| {
        Error::ArchiveError(format!("failed to extract {}: {e}", archive.display()))
    })
}
