//! Status command implementation
//!
//! Lists stored checkpoints, optionally for a single scan, and can discard
//! the checkpoint of a scan so the next run starts over.

use super::resolve_state_dir;
use crate::core::state::{Checkpoint, CheckpointDetail, FileCheckpointStore};
use crate::domain::ScanId;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show this scan
    #[arg(long)]
    pub scan_id: Option<ScanId>,

    /// Checkpoint directory (defaults to `state.checkpoint_dir`)
    #[arg(long)]
    pub state_dir: Option<String>,

    /// Delete the stored checkpoint of `--scan-id`
    #[arg(long, requires = "scan_id")]
    pub reset: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking extraction status");

        let state_dir = match resolve_state_dir(self.state_dir.as_deref(), config_path) {
            Ok(dir) => dir,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };
        let store = FileCheckpointStore::new(&state_dir);

        if self.reset {
            if let Some(scan_id) = &self.scan_id {
                if store.remove(scan_id).await? {
                    tracing::info!(scan_id = %scan_id, "Checkpoint removed");
                    println!("🗑  Removed checkpoint for {scan_id}");
                } else {
                    println!("No checkpoint stored for {scan_id}");
                }
            }
            return Ok(0);
        }

        let checkpoints: Vec<Checkpoint> = match &self.scan_id {
            Some(scan_id) => store.load_latest(scan_id).await?.into_iter().collect(),
            None => store.list().await?,
        };

        println!("📊 Extraction Status ({state_dir})");
        println!();

        if checkpoints.is_empty() {
            println!("No checkpoints found.");
            println!("Run 'deal-etl extract' to start extracting deals.");
            return Ok(0);
        }

        println!("Found {} scan(s):", checkpoints.len());
        println!();
        for checkpoint in &checkpoints {
            print_checkpoint(checkpoint);
        }

        Ok(0)
    }
}

fn print_checkpoint(checkpoint: &Checkpoint) {
    println!("  Scan: {}", checkpoint.scan_id);
    println!("    Phase: {}", checkpoint.phase());
    println!("    Deals emitted: {}", checkpoint.records_processed);
    println!("    Pages completed: {}", checkpoint.page_number);
    println!(
        "    Cursor: {}",
        checkpoint
            .cursor
            .as_ref()
            .map_or("(start)", |c| c.as_str())
    );
    println!("    Updated: {}", checkpoint.created_at.to_rfc3339());

    match &checkpoint.detail {
        CheckpointDetail::Paused { pause_reason, .. }
        | CheckpointDetail::PausedMidPage { pause_reason, .. } => {
            println!("    Reason: {pause_reason}");
        }
        CheckpointDetail::Cancelled {
            cancellation_reason,
            ..
        } => {
            println!("    Reason: {cancellation_reason}");
        }
        CheckpointDetail::Error {
            error, error_page, ..
        } => {
            println!("    Error on page {error_page}: {error}");
        }
        CheckpointDetail::Processing { .. } | CheckpointDetail::Completed { .. } => {}
    }
    println!();
}
