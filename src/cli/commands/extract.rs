//! Extract command implementation
//!
//! Runs the extraction engine against HubSpot and appends the transformed
//! deals to a JSON-lines file.

use crate::adapters::hubspot::HubSpotClient;
use crate::config::{load_config, EtlConfig};
use crate::core::extract::{
    CombinedSignals, DealExtractor, ExtractionOutcome, ExtractionSettings, JsonLinesSink,
    MarkerFileSignals, ScanControl,
};
use crate::core::state::{CheckpointPhase, CheckpointRecorder, FileCheckpointStore, ResumeState};
use crate::domain::{EtlError, ScanId, TenantId};
use clap::Args;
use std::sync::Arc;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Scan id (defaults to `job.scan_id`, then a generated id)
    #[arg(long)]
    pub scan_id: Option<ScanId>,

    /// Tenant id stamped on every row (defaults to `job.tenant_id`)
    #[arg(long)]
    pub tenant_id: Option<TenantId>,

    /// Continue the scan from its stored checkpoint
    #[arg(long)]
    pub resume: bool,

    /// Override the output file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Keep only deals in this stage (repeatable)
    #[arg(long, value_name = "STAGE")]
    pub deal_stage: Vec<String>,

    /// Keep only deals in this pipeline (repeatable)
    #[arg(long, value_name = "PIPELINE")]
    pub pipeline: Vec<String>,

    /// Extract archived deals instead of active ones
    #[arg(long)]
    pub archived: bool,

    /// Override the per-run page ceiling
    #[arg(long)]
    pub max_pages: Option<u32>,
}

impl ExtractArgs {
    /// Execute the extract command
    ///
    /// `control` is shared with the process signal handler, which raises its
    /// pause flag on Ctrl+C.
    pub async fn execute(&self, config_path: &str, control: ScanControl) -> anyhow::Result<i32> {
        tracing::info!("Starting extract command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let (scan_id, tenant_id) = match self.resolve_ids(&config) {
            Ok(ids) => ids,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let client = match HubSpotClient::new(&config.hubspot) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create HubSpot client");
                eprintln!("Failed to create HubSpot client: {e}");
                return Ok(2);
            }
        };

        if !client.validate_credentials().await {
            tracing::error!("HubSpot credentials were rejected");
            eprintln!("HubSpot credentials were rejected or the API is unreachable");
            return Ok(4);
        }

        let store = FileCheckpointStore::new(&config.state.checkpoint_dir);

        let resume = if self.resume {
            match self.load_resume_state(&store, &scan_id).await? {
                ResumeDecision::Start(state) => state,
                ResumeDecision::Stop(code) => return Ok(code),
            }
        } else {
            None
        };

        // Stale markers from an earlier run would stop this one at once
        let markers = MarkerFileSignals::new(&config.state.checkpoint_dir);
        markers.clear(&scan_id).await?;

        let signals = CombinedSignals::new()
            .with(Arc::new(control))
            .with(Arc::new(markers));

        let recorder = if config.state.enable_checkpointing {
            CheckpointRecorder::new(Arc::new(store))
        } else {
            tracing::warn!("Checkpointing disabled; this scan cannot be resumed");
            CheckpointRecorder::disabled()
        };

        let mut sink = match JsonLinesSink::append(&config.output.path).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, path = %config.output.path, "Failed to open output");
                eprintln!("Failed to open output file: {e}");
                return Ok(5);
            }
        };

        let extractor = DealExtractor::new(Arc::new(client), scan_id.clone())
            .with_tenant(tenant_id)
            .with_filters(config.extraction.filters())
            .with_settings(ExtractionSettings::from(&config.extraction))
            .with_checkpoints(recorder)
            .with_signals(Arc::new(signals));

        println!("Starting extraction for scan {scan_id}");
        println!("  Output: {}", config.output.path);
        println!();

        let result = extractor.run(resume, &mut sink).await;

        if let Err(e) = sink.flush().await {
            tracing::error!(error = %e, "Failed to flush output");
            eprintln!("Failed to flush output: {e}");
            return Ok(5);
        }

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(scan_id = %scan_id, error = %e, "Extraction failed");
                eprintln!("Extraction failed: {e}");
                if config.state.enable_checkpointing {
                    eprintln!("Resume later with: deal-etl extract --scan-id {scan_id} --resume");
                }
                return Ok(match e {
                    EtlError::Remote(_) => 4,
                    _ => 5,
                });
            }
        };

        summary.log();

        println!("Extraction Summary:");
        println!("  Scan: {}", summary.scan_id);
        println!("  Outcome: {}", summary.outcome);
        println!("  Deals emitted (this run): {}", summary.records_emitted);
        println!("  Deals emitted (total): {}", summary.total_records);
        println!("  Pages fetched (this run): {}", summary.pages_fetched);
        println!("  Pages completed (total): {}", summary.page_number);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Throughput: {:.1} deals/s", summary.records_per_second());
        println!();

        if summary.outcome.is_resumable() {
            println!("Resume with: deal-etl extract --scan-id {scan_id} --resume");
        }

        Ok(match summary.outcome {
            ExtractionOutcome::Completed => 0,
            _ => 3,
        })
    }

    fn apply_overrides(&self, config: &mut EtlConfig) {
        if !self.deal_stage.is_empty() {
            tracing::info!(deal_stages = ?self.deal_stage, "Overriding deal stages from CLI");
            config.extraction.deal_stages = self.deal_stage.clone();
        }
        if !self.pipeline.is_empty() {
            tracing::info!(pipelines = ?self.pipeline, "Overriding pipelines from CLI");
            config.extraction.pipelines = self.pipeline.clone();
        }
        if self.archived {
            config.extraction.archived = true;
        }
        if let Some(max_pages) = self.max_pages {
            config.extraction.max_pages = max_pages;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
    }

    fn resolve_ids(&self, config: &EtlConfig) -> Result<(ScanId, Option<TenantId>), String> {
        let scan_id = match (&self.scan_id, &config.job.scan_id) {
            (Some(id), _) => id.clone(),
            (None, Some(id)) => ScanId::new(id.as_str())?,
            (None, None) if self.resume => {
                return Err("--resume needs a scan id (--scan-id or job.scan_id)".to_string());
            }
            (None, None) => ScanId::new(format!("scan-{}", uuid::Uuid::new_v4()))?,
        };

        let tenant_id = match (&self.tenant_id, &config.job.tenant_id) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(id)) => Some(TenantId::new(id.as_str())?),
            (None, None) => None,
        };

        Ok((scan_id, tenant_id))
    }

    async fn load_resume_state(
        &self,
        store: &FileCheckpointStore,
        scan_id: &ScanId,
    ) -> anyhow::Result<ResumeDecision> {
        let Some(checkpoint) = store.load_latest(scan_id).await? else {
            tracing::info!(scan_id = %scan_id, "No checkpoint found, starting from the beginning");
            println!("No checkpoint found for {scan_id}; starting from the beginning");
            return Ok(ResumeDecision::Start(None));
        };

        match checkpoint.phase() {
            CheckpointPhase::Completed => {
                println!("Scan {scan_id} already completed; nothing to resume");
                Ok(ResumeDecision::Stop(0))
            }
            CheckpointPhase::Cancelled => {
                println!("Scan {scan_id} was cancelled; start a new scan instead");
                Ok(ResumeDecision::Stop(3))
            }
            phase => {
                tracing::info!(
                    scan_id = %scan_id,
                    phase = %phase,
                    page_number = checkpoint.page_number,
                    records_processed = checkpoint.records_processed,
                    "Resuming from checkpoint"
                );
                println!(
                    "Resuming {scan_id} from page {} ({} deals already emitted)",
                    checkpoint.page_number + 1,
                    checkpoint.records_processed
                );
                Ok(ResumeDecision::Start(checkpoint.resume_state()))
            }
        }
    }
}

enum ResumeDecision {
    Start(Option<ResumeState>),
    Stop(i32),
}
