// src/mirror/client.rs

//! HTTP transfer unit
//!
//! Wraps a blocking reqwest client for fetching database archives and
//! package artifacts. One transfer streams one resource into its destination
//! file while a paired [`FileWatcher`] renders progress from the file's
//! growth.
//!
//! Deliberate contract points:
//! - no request timeout is configured; a stalled upstream blocks the run
//! - every response must carry a numeric `Content-Length`; there is no
//!   unknown-size fallback
//! - the body streams directly into the destination path (no staging file),
//!   since the watcher stats that same path
//! - errors abort the transfer with no retry

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::header::{self, HeaderValue};
use tracing::info;

use crate::error::{Error, Result};
use crate::progress::{CliProgress, FileWatcher, ProgressTracker};

/// HTTP client shared by all transfers of one synchronizer
pub struct MirrorClient {
    client: Client,
}

impl MirrorClient {
    /// Create the client
    ///
    /// The default request timeout is disabled on purpose: the engine has no
    /// cancellation anywhere, and large artifact downloads on slow links can
    /// legitimately outlast any fixed deadline.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| Error::NetworkError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Stream `url` into `dest`, rendering progress on the terminal
    ///
    /// Returns the number of bytes written.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        self.fetch_with(url, dest, Box::new(CliProgress::new(&name)))
    }

    /// Stream `url` into `dest`, reporting through an explicit tracker
    pub fn fetch_with(
        &self,
        url: &str,
        dest: &Path,
        tracker: Box<dyn ProgressTracker>,
    ) -> Result<u64> {
        info!("downloading {url}");
        let start = Instant::now();

        // Created before the request so the watcher never sees a missing file
        let mut file = File::create(dest)
            .map_err(|e| Error::FilesystemError(format!("failed to create {}: {e}", dest.display())))?;

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::NetworkError(format!("failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::NetworkError(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let expected = parse_content_length(response.headers().get(header::CONTENT_LENGTH), url)?;

        let watcher = FileWatcher::spawn(dest.to_path_buf(), expected, tracker);
        let copied = io::copy(&mut response, &mut file);

        match copied {
            Ok(written) => {
                // Handshake: the final 100% line is rendered before we return
                watcher.finish();
                info!("downloaded {url} in {:.2}s", start.elapsed().as_secs_f64());
                Ok(written)
            }
            Err(e) => {
                // Dropping the watcher stops it without a 100% render
                drop(watcher);
                Err(Error::NetworkError(format!(
                    "failed to stream {url} to {}: {e}",
                    dest.display()
                )))
            }
        }
    }
}

/// Expected byte count from a mandatory Content-Length header
fn parse_content_length(value: Option<&HeaderValue>, url: &str) -> Result<u64> {
    let value = value.ok_or_else(|| {
        Error::ProtocolError(format!("missing Content-Length header from {url}"))
    })?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| {
            Error::ProtocolError(format!(
                "non-numeric Content-Length {value:?} from {url}"
            ))
        })
}
