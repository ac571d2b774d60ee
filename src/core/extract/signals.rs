//! Pause and cancel signals
//!
//! The engine polls a [`ScanSignals`] before every page fetch (cancel, then
//! pause) and before every record (pause only). Signals never interrupt an
//! in-flight request.

use crate::domain::ScanId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop predicates, keyed by scan
#[async_trait]
pub trait ScanSignals: Send + Sync {
    /// Whether the scan should stop for good
    async fn is_cancel_requested(&self, scan_id: &ScanId) -> bool;

    /// Whether the scan should stop and be resumable
    async fn is_pause_requested(&self, scan_id: &ScanId) -> bool;
}

/// Never pauses, never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignals;

#[async_trait]
impl ScanSignals for NoSignals {
    async fn is_cancel_requested(&self, _scan_id: &ScanId) -> bool {
        false
    }

    async fn is_pause_requested(&self, _scan_id: &ScanId) -> bool {
        false
    }
}

/// In-process flags for a single run
///
/// Clones share state, so one handle can be given to the engine and another
/// to a signal handler.
///
/// ```
/// use deal_etl::core::extract::ScanControl;
///
/// let control = ScanControl::new();
/// let handle = control.clone();
/// handle.request_pause();
/// assert!(control.pause_flag());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    pause: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn pause_flag(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    pub fn cancel_flag(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Lower both flags
    pub fn reset(&self) {
        self.pause.store(false, Ordering::SeqCst);
        self.cancel.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScanSignals for ScanControl {
    async fn is_cancel_requested(&self, _scan_id: &ScanId) -> bool {
        self.cancel_flag()
    }

    async fn is_pause_requested(&self, _scan_id: &ScanId) -> bool {
        self.pause_flag()
    }
}

/// Cross-process signals as marker files
///
/// A scan is paused while `<dir>/<scan_id>.pause` exists and cancelled while
/// `<dir>/<scan_id>.cancel` exists.
#[derive(Debug, Clone)]
pub struct MarkerFileSignals {
    dir: PathBuf,
}

impl MarkerFileSignals {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pause_path(&self, scan_id: &ScanId) -> PathBuf {
        self.dir.join(format!("{}.pause", scan_id.as_str()))
    }

    pub fn cancel_path(&self, scan_id: &ScanId) -> PathBuf {
        self.dir.join(format!("{}.cancel", scan_id.as_str()))
    }

    /// Create the pause marker for a scan
    pub async fn request_pause(&self, scan_id: &ScanId) -> std::io::Result<PathBuf> {
        self.touch(self.pause_path(scan_id)).await
    }

    /// Create the cancel marker for a scan
    pub async fn request_cancel(&self, scan_id: &ScanId) -> std::io::Result<PathBuf> {
        self.touch(self.cancel_path(scan_id)).await
    }

    /// Remove both markers of a scan
    ///
    /// Called before a resumed run so an old pause request does not stop it
    /// immediately.
    pub async fn clear(&self, scan_id: &ScanId) -> std::io::Result<()> {
        for path in [self.pause_path(scan_id), self.cancel_path(scan_id)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn touch(&self, path: PathBuf) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, chrono::Utc::now().to_rfc3339()).await?;
        Ok(path)
    }
}

#[async_trait]
impl ScanSignals for MarkerFileSignals {
    async fn is_cancel_requested(&self, scan_id: &ScanId) -> bool {
        tokio::fs::try_exists(self.cancel_path(scan_id))
            .await
            .unwrap_or(false)
    }

    async fn is_pause_requested(&self, scan_id: &ScanId) -> bool {
        tokio::fs::try_exists(self.pause_path(scan_id))
            .await
            .unwrap_or(false)
    }
}

/// Raised when any of the wrapped sources is raised
#[derive(Clone, Default)]
pub struct CombinedSignals {
    sources: Vec<Arc<dyn ScanSignals>>,
}

impl CombinedSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: Arc<dyn ScanSignals>) -> Self {
        self.sources.push(source);
        self
    }
}

#[async_trait]
impl ScanSignals for CombinedSignals {
    async fn is_cancel_requested(&self, scan_id: &ScanId) -> bool {
        for source in &self.sources {
            if source.is_cancel_requested(scan_id).await {
                return true;
            }
        }
        false
    }

    async fn is_pause_requested(&self, scan_id: &ScanId) -> bool {
        for source in &self.sources {
            if source.is_pause_requested(scan_id).await {
                return true;
            }
        }
        false
    }
}
