//! Pause and cancel command implementation
//!
//! Both commands drop a marker file next to the scan's checkpoint. A running
//! `extract` polls for it and stops at its next check.

use super::resolve_state_dir;
use crate::core::extract::MarkerFileSignals;
use crate::domain::ScanId;
use clap::Args;

/// Arguments shared by the pause and cancel commands
#[derive(Args, Debug)]
pub struct SignalArgs {
    /// Scan to signal
    #[arg(long)]
    pub scan_id: ScanId,

    /// Checkpoint directory (defaults to `state.checkpoint_dir`)
    #[arg(long)]
    pub state_dir: Option<String>,
}

/// Which request to raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Pause,
    Cancel,
}

impl SignalArgs {
    /// Execute the pause or cancel command
    pub async fn execute(&self, config_path: &str, kind: SignalKind) -> anyhow::Result<i32> {
        let state_dir = match resolve_state_dir(self.state_dir.as_deref(), config_path) {
            Ok(dir) => dir,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let markers = MarkerFileSignals::new(state_dir);
        let path = match kind {
            SignalKind::Pause => markers.request_pause(&self.scan_id).await?,
            SignalKind::Cancel => markers.request_cancel(&self.scan_id).await?,
        };

        tracing::info!(
            scan_id = %self.scan_id,
            signal = ?kind,
            marker = %path.display(),
            "Signal requested"
        );
        match kind {
            SignalKind::Pause => println!("⏸  Pause requested for {}", self.scan_id),
            SignalKind::Cancel => println!("⏹  Cancel requested for {}", self.scan_id),
        }
        println!("   Marker: {}", path.display());

        Ok(0)
    }
}
