// src/progress.rs

//! Download progress reporting
//!
//! Progress for a single transfer is observed from the outside: a watcher
//! thread polls the destination file's size while the transfer streams into
//! it, and renders percent-complete through a [`ProgressTracker`]. The file
//! size is the only shared state — the transfer is the sole writer, the
//! watcher the sole reader — so no locking is involved.
//!
//! The watcher is paired 1:1 with its transfer. [`FileWatcher::finish`]
//! performs the completion handshake: it signals the watcher, which does one
//! final read-and-render so the last value shown is exactly 100%, and then
//! joins the thread. Dropping the watcher instead (the abort path) stops it
//! without the final render.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Interval between file-size observations (~60 per second)
const POLL_INTERVAL: Duration = Duration::from_millis(1000 / 60);

/// Rendering sink for one download's progress
///
/// Implementations must render 100% on `finish`; `abandon` stops rendering
/// at the current position.
pub trait ProgressTracker: Send + Sync {
    /// Set the expected total in bytes
    fn set_length(&self, length: u64);

    /// Set the current position in bytes
    fn set_position(&self, position: u64);

    /// Final render at 100%
    fn finish(&self);

    /// Stop without reaching 100%
    fn abandon(&self);
}

impl<T: ProgressTracker> ProgressTracker for Arc<T> {
    fn set_length(&self, length: u64) {
        (**self).set_length(length);
    }

    fn set_position(&self, position: u64) {
        (**self).set_position(position);
    }

    fn finish(&self) {
        (**self).finish();
    }

    fn abandon(&self) {
        (**self).abandon();
    }
}

/// Terminal progress bar, one updating line per download
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Create a progress bar labeled with the downloaded file's name
    pub fn new(name: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:30.cyan/blue}] {percent:>3} %")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        bar.set_message(name.to_string());
        Self { bar }
    }
}

impl ProgressTracker for CliProgress {
    fn set_length(&self, length: u64) {
        self.bar.set_length(length);
    }

    fn set_position(&self, position: u64) {
        self.bar.set_position(position);
    }

    fn finish(&self) {
        // finish() moves the bar to its length, rendering 100%
        self.bar.finish();
    }

    fn abandon(&self) {
        self.bar.abandon();
    }
}

/// No-output tracker for quiet paths and tests
#[derive(Debug, Default)]
pub struct SilentProgress {
    length: AtomicU64,
    position: AtomicU64,
    finished: AtomicBool,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded position
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

impl ProgressTracker for SilentProgress {
    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.position
            .store(self.length.load(Ordering::Relaxed), Ordering::Relaxed);
        self.finished.store(true, Ordering::Relaxed);
    }

    fn abandon(&self) {}
}

/// Watcher thread observing a destination file during one transfer
///
/// Spawn it after the destination file has been created and the expected
/// size is known; call [`finish`](Self::finish) once the transfer completes.
/// The watcher never outlives its transfer: `finish` joins the thread after
/// the final render, and plain drop disconnects the signal channel and joins
/// without rendering 100%.
pub struct FileWatcher {
    done: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FileWatcher {
    /// Start watching `path`, expecting it to grow to `expected` bytes
    pub fn spawn(path: PathBuf, expected: u64, tracker: Box<dyn ProgressTracker>) -> Self {
        let (done, signal) = mpsc::channel();
        let handle = thread::spawn(move || watch(&path, expected, &signal, tracker.as_ref()));
        Self {
            done: Some(done),
            handle: Some(handle),
        }
    }

    /// Completion handshake: signal the watcher, wait for its final render
    ///
    /// Returns only after the watcher has rendered 100% and exited.
    pub fn finish(mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        // Abort path: closing the channel stops the watcher mid-transfer
        drop(self.done.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn watch(path: &Path, expected: u64, signal: &Receiver<()>, tracker: &dyn ProgressTracker) {
    tracker.set_length(expected);
    loop {
        observe(path, expected, tracker);

        // The poll interval doubles as the cooperative sleep between
        // observations; the signal arriving cuts it short.
        match signal.recv_timeout(POLL_INTERVAL) {
            Ok(()) => {
                // One final read-and-render, then pin the line at 100%
                observe(path, expected, tracker);
                tracker.finish();
                return;
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracker.abandon();
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn observe(path: &Path, expected: u64, tracker: &dyn ProgressTracker) {
    match fs::metadata(path) {
        // A zero-size file still renders as started
        Ok(meta) => tracker.set_position(meta.len().max(1).min(expected)),
        // A missing file is a reporting problem, never a transfer failure
        Err(e) => warn!("cannot stat {}: {e}", path.display()),
    }
}
