//! Downstream destinations for transformed deals
//!
//! The engine awaits [`DealSink::emit`] for every row, so a slow sink slows
//! the walk instead of growing a buffer.

use crate::domain::{EtlError, Result, TransformedDeal};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

/// Receives transformed deals in emission order
#[async_trait]
pub trait DealSink: Send {
    /// Accept one row
    ///
    /// # Errors
    ///
    /// Returns [`EtlError::Sink`] if the row cannot be accepted.
    async fn emit(&mut self, deal: TransformedDeal) -> Result<()>;
}

#[async_trait]
impl DealSink for Vec<TransformedDeal> {
    async fn emit(&mut self, deal: TransformedDeal) -> Result<()> {
        self.push(deal);
        Ok(())
    }
}

/// Forwards rows into a bounded channel
///
/// A full channel suspends the engine; a closed one fails the run.
pub struct ChannelSink {
    tx: mpsc::Sender<TransformedDeal>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<TransformedDeal>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of a channel holding `capacity` rows
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransformedDeal>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl DealSink for ChannelSink {
    async fn emit(&mut self, deal: TransformedDeal) -> Result<()> {
        self.tx
            .send(deal)
            .await
            .map_err(|_| EtlError::Sink("downstream receiver closed".to_string()))
    }
}

/// Appends rows to a JSON-lines file
pub struct JsonLinesSink {
    writer: BufWriter<File>,
    written: u64,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating parent directories as needed
    pub async fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| EtlError::Sink(format!("Failed to open {}: {e}", path.display())))?;

        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Rows written through this handle
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush buffered rows to disk
    pub async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| EtlError::Sink(format!("Failed to flush output: {e}")))
    }
}

#[async_trait]
impl DealSink for JsonLinesSink {
    async fn emit(&mut self, deal: TransformedDeal) -> Result<()> {
        let mut line = serde_json::to_vec(&deal)?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| EtlError::Sink(format!("Failed to write deal: {e}")))?;
        self.written += 1;
        Ok(())
    }
}
