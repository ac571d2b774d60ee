//! Checkpoint persistence seam
//!
//! [`CheckpointSink`] is where checkpoints leave the engine. Its error type,
//! [`CheckpointWriteError`], does not convert into the run error, and the
//! engine only ever talks to a sink through [`CheckpointRecorder`], which
//! logs a failed write and carries on.

use super::checkpoint::Checkpoint;
use crate::domain::CheckpointWriteError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Destination for checkpoints
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    /// Persist a checkpoint, replacing any earlier one for the same scan
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointWriteError>;
}

/// Best-effort checkpoint writer used by the engine
#[derive(Clone, Default)]
pub struct CheckpointRecorder {
    sink: Option<Arc<dyn CheckpointSink>>,
}

impl CheckpointRecorder {
    /// Record into the given sink
    pub fn new(sink: Arc<dyn CheckpointSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Drop every checkpoint
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Whether a sink is attached
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Write a checkpoint, logging instead of failing
    ///
    /// Returns `true` when the sink accepted it.
    pub async fn record(&self, checkpoint: &Checkpoint) -> bool {
        let Some(sink) = &self.sink else {
            return false;
        };

        match sink.save(checkpoint).await {
            Ok(()) => {
                tracing::debug!(
                    scan_id = %checkpoint.scan_id,
                    phase = %checkpoint.phase(),
                    page_number = checkpoint.page_number,
                    records_processed = checkpoint.records_processed,
                    cursor = ?checkpoint.cursor,
                    "Checkpoint saved"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    scan_id = %checkpoint.scan_id,
                    phase = %checkpoint.phase(),
                    error = %e,
                    "Failed to save checkpoint"
                );
                false
            }
        }
    }
}

/// In-memory sink keeping every checkpoint in write order
#[derive(Debug, Default)]
pub struct MemoryCheckpointSink {
    saved: Mutex<Vec<Checkpoint>>,
}

impl MemoryCheckpointSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All checkpoints written so far
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }

    /// Most recent checkpoint
    pub fn latest(&self) -> Option<Checkpoint> {
        self.saved
            .lock()
            .ok()
            .and_then(|saved| saved.last().cloned())
    }
}

#[async_trait]
impl CheckpointSink for MemoryCheckpointSink {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointWriteError> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| CheckpointWriteError("checkpoint buffer poisoned".to_string()))?;
        saved.push(checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{CheckpointDetail, CheckpointPhase};
    use crate::domain::ScanId;

    struct FailingSink;

    #[async_trait]
    impl CheckpointSink for FailingSink {
        async fn save(&self, _checkpoint: &Checkpoint) -> Result<(), CheckpointWriteError> {
            Err(CheckpointWriteError("disk full".to_string()))
        }
    }

    fn checkpoint() -> Checkpoint {
        Checkpoint::new(
            ScanId::new("scan-rec").unwrap(),
            0,
            None,
            0,
            100,
            CheckpointDetail::Cancelled {
                cancellation_reason: "user_requested".to_string(),
                cancelled_at_page: 0,
            },
        )
    }

    #[tokio::test]
    async fn test_record_into_memory() {
        let sink = Arc::new(MemoryCheckpointSink::new());
        let recorder = CheckpointRecorder::new(sink.clone());

        assert!(recorder.record(&checkpoint()).await);
        assert_eq!(sink.checkpoints().len(), 1);
        let latest = sink.latest().unwrap();
        assert_eq!(latest.phase(), CheckpointPhase::Cancelled);
        assert_eq!(latest.scan_id.as_str(), "scan-rec");
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let recorder = CheckpointRecorder::new(Arc::new(FailingSink));
        assert!(!recorder.record(&checkpoint()).await);
    }

    #[tokio::test]
    async fn test_disabled_recorder() {
        let recorder = CheckpointRecorder::disabled();
        assert!(!recorder.is_enabled());
        assert!(!recorder.record(&checkpoint()).await);
    }
}
