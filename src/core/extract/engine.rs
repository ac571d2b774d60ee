//! Extraction engine
//!
//! [`DealExtractor`] walks the deals collection page by page, transforming
//! and filtering each record, handing survivors to a [`DealSink`], and
//! turning pause, cancel, page-ceiling and fetch-failure events into
//! checkpoints.
//!
//! Counters follow one convention throughout: `page_number` is the number
//! of pages fully completed, so rows of the page being processed carry
//! `page_number + 1`, and `records_processed` only grows when a page
//! completes (a mid-page pause is the exception and counts the partial page).

use super::signals::{NoSignals, ScanSignals};
use super::sink::DealSink;
use super::summary::{ExtractionOutcome, ExtractionSummary};
use super::{DealFilters, DealSource};
use crate::config::ExtractionConfig;
use crate::core::state::{
    Checkpoint, CheckpointDetail, CheckpointRecorder, ResumeState, CANCEL_USER_REQUESTED,
    PAUSE_PAGE_LIMIT_REACHED, PAUSE_USER_REQUESTED, PAUSE_USER_REQUESTED_MID_PAGE,
};
use crate::core::transform::transform_deal;
use crate::domain::{Cursor, EtlError, Result, ScanId, TenantId};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Engine knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    /// Records requested per page
    pub batch_size: u32,

    /// Write a processing checkpoint every N completed pages
    pub checkpoint_interval_pages: u32,

    /// Pages one run may fetch before pausing itself
    pub max_pages: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            checkpoint_interval_pages: 5,
            max_pages: 1000,
        }
    }
}

impl From<&ExtractionConfig> for ExtractionSettings {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            checkpoint_interval_pages: config.checkpoint_interval_pages,
            max_pages: config.max_pages,
        }
    }
}

/// Position of a run: the three counters every checkpoint records
#[derive(Debug, Clone)]
struct Progress {
    cursor: Option<Cursor>,
    page_number: u32,
    records_processed: u64,
}

/// Resumable paginated extractor
///
/// # Example
///
/// ```no_run
/// use deal_etl::adapters::hubspot::HubSpotClient;
/// use deal_etl::config::load_config;
/// use deal_etl::core::extract::{DealExtractor, ScanControl};
/// use deal_etl::core::state::{CheckpointRecorder, FileCheckpointStore};
/// use deal_etl::domain::{ScanId, TransformedDeal};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config("deal-etl.toml")?;
/// let client = Arc::new(HubSpotClient::new(&config.hubspot)?);
/// let store = Arc::new(FileCheckpointStore::new(&config.state.checkpoint_dir));
///
/// let extractor = DealExtractor::new(client, ScanId::new("scan-1")?)
///     .with_filters(config.extraction.filters())
///     .with_checkpoints(CheckpointRecorder::new(store))
///     .with_signals(Arc::new(ScanControl::new()));
///
/// let mut rows: Vec<TransformedDeal> = Vec::new();
/// let summary = extractor.run(None, &mut rows).await?;
/// println!("{} ({} rows)", summary.outcome, summary.records_emitted);
/// # Ok(())
/// # }
/// ```
pub struct DealExtractor {
    source: Arc<dyn DealSource>,
    scan_id: ScanId,
    tenant_id: Option<TenantId>,
    filters: DealFilters,
    settings: ExtractionSettings,
    recorder: CheckpointRecorder,
    signals: Arc<dyn ScanSignals>,
}

impl DealExtractor {
    /// Extractor with default settings, no filters, no checkpoints and no signals
    pub fn new(source: Arc<dyn DealSource>, scan_id: ScanId) -> Self {
        Self {
            source,
            scan_id,
            tenant_id: None,
            filters: DealFilters::default(),
            settings: ExtractionSettings::default(),
            recorder: CheckpointRecorder::disabled(),
            signals: Arc::new(NoSignals),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_filters(mut self, filters: DealFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_settings(mut self, settings: ExtractionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_checkpoints(mut self, recorder: CheckpointRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_signals(mut self, signals: Arc<dyn ScanSignals>) -> Self {
        self.signals = signals;
        self
    }

    pub fn scan_id(&self) -> &ScanId {
        &self.scan_id
    }

    /// Run the extraction until end of data, a stop signal, the page ceiling or an error
    ///
    /// With `resume`, the walk starts at its cursor and its counters carry over.
    ///
    /// # Errors
    ///
    /// A failed page fetch or a rejected row writes an `error` checkpoint
    /// (cursor of the failed page, totals of completed pages) and returns the error.
    pub async fn run<S>(&self, resume: Option<ResumeState>, sink: &mut S) -> Result<ExtractionSummary>
    where
        S: DealSink + ?Sized,
    {
        let started = Instant::now();
        let batch_size = self.settings.batch_size;
        let checkpoint_interval = self.settings.checkpoint_interval_pages.max(1);

        let mut progress = match resume {
            Some(state) => {
                tracing::info!(
                    scan_id = %self.scan_id,
                    page_number = state.page_number + 1,
                    total_processed = state.records_processed,
                    cursor = ?state.cursor,
                    "Resuming deals extraction"
                );
                Progress {
                    cursor: state.cursor,
                    page_number: state.page_number,
                    records_processed: state.records_processed,
                }
            }
            None => {
                tracing::info!(scan_id = %self.scan_id, "Starting fresh deals extraction");
                Progress {
                    cursor: None,
                    page_number: 0,
                    records_processed: 0,
                }
            }
        };

        let mut pages_fetched: u32 = 0;
        let mut records_emitted: u64 = 0;

        let outcome = loop {
            if pages_fetched >= self.settings.max_pages {
                tracing::warn!(
                    scan_id = %self.scan_id,
                    pages_fetched,
                    page_number = progress.page_number,
                    "Page limit reached, pausing extraction"
                );
                self.checkpoint(
                    &progress,
                    CheckpointDetail::Paused {
                        pause_reason: PAUSE_PAGE_LIMIT_REACHED.to_string(),
                        paused_at_page: progress.page_number,
                        paused_at: Utc::now(),
                    },
                )
                .await;
                break ExtractionOutcome::PageLimitReached;
            }

            if self.signals.is_cancel_requested(&self.scan_id).await {
                tracing::info!(
                    scan_id = %self.scan_id,
                    page_number = progress.page_number + 1,
                    total_processed = progress.records_processed,
                    "Deals extraction cancelled"
                );
                self.checkpoint(
                    &progress,
                    CheckpointDetail::Cancelled {
                        cancellation_reason: CANCEL_USER_REQUESTED.to_string(),
                        cancelled_at_page: progress.page_number,
                    },
                )
                .await;
                break ExtractionOutcome::Cancelled;
            }

            if self.signals.is_pause_requested(&self.scan_id).await {
                tracing::info!(
                    scan_id = %self.scan_id,
                    page_number = progress.page_number + 1,
                    total_processed = progress.records_processed,
                    "Deals extraction paused"
                );
                self.checkpoint(
                    &progress,
                    CheckpointDetail::Paused {
                        pause_reason: PAUSE_USER_REQUESTED.to_string(),
                        paused_at_page: progress.page_number,
                        paused_at: Utc::now(),
                    },
                )
                .await;
                break ExtractionOutcome::Paused;
            }

            tracing::debug!(
                scan_id = %self.scan_id,
                page_number = progress.page_number + 1,
                cursor = ?progress.cursor,
                "Fetching deals page"
            );

            let page = match self
                .source
                .fetch_page(
                    batch_size,
                    progress.cursor.as_ref(),
                    self.filters.properties.as_deref(),
                    self.filters.archived,
                )
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(
                        scan_id = %self.scan_id,
                        page_number = progress.page_number + 1,
                        error = %e,
                        "Error fetching deals page"
                    );
                    self.error_checkpoint(&progress, &e).await;
                    return Err(e);
                }
            };
            pages_fetched += 1;

            let mut page_records: u64 = 0;
            let mut paused_mid_page = false;

            for raw in &page.results {
                if self.signals.is_pause_requested(&self.scan_id).await {
                    paused_mid_page = true;
                    break;
                }

                let deal = transform_deal(
                    raw,
                    &self.scan_id,
                    self.tenant_id.as_ref(),
                    progress.page_number + 1,
                );
                if !self.filters.matches(&deal) {
                    continue;
                }

                if let Err(e) = sink.emit(deal).await {
                    let e = match e {
                        EtlError::Sink(_) => e,
                        other => EtlError::Sink(other.to_string()),
                    };
                    tracing::error!(
                        scan_id = %self.scan_id,
                        page_number = progress.page_number + 1,
                        records_in_page = page_records,
                        error = %e,
                        "Downstream sink rejected a deal"
                    );
                    self.error_checkpoint(&progress, &e).await;
                    return Err(e);
                }
                page_records += 1;
                records_emitted += 1;
            }

            if paused_mid_page {
                tracing::info!(
                    scan_id = %self.scan_id,
                    page_number = progress.page_number + 1,
                    records_in_page = page_records,
                    total_processed = progress.records_processed + page_records,
                    "Deals extraction paused mid-page"
                );
                // Cursor and page stay on the interrupted page, so a resumed
                // run fetches it again and re-emits its first rows.
                progress.records_processed += page_records;
                self.checkpoint(
                    &progress,
                    CheckpointDetail::PausedMidPage {
                        pause_reason: PAUSE_USER_REQUESTED_MID_PAGE.to_string(),
                        paused_at_page: progress.page_number,
                        records_completed_in_page: page_records,
                        paused_at: Utc::now(),
                    },
                )
                .await;
                break ExtractionOutcome::PausedMidPage;
            }

            progress.records_processed += page_records;
            progress.page_number += 1;

            if progress.page_number % checkpoint_interval == 0 {
                let at_next_page = Progress {
                    cursor: page.next_cursor.clone(),
                    ..progress.clone()
                };
                self.checkpoint(
                    &at_next_page,
                    CheckpointDetail::Processing {
                        pages_processed: progress.page_number,
                        last_page_records: page_records,
                        has_more_pages: page.has_more(),
                    },
                )
                .await;
            }

            match page.next_cursor {
                Some(next) => progress.cursor = Some(next),
                None => {
                    progress.cursor = None;
                    tracing::info!(
                        scan_id = %self.scan_id,
                        total_records = progress.records_processed,
                        total_pages = progress.page_number,
                        "Deals extraction completed"
                    );
                    self.checkpoint(
                        &progress,
                        CheckpointDetail::Completed {
                            completion_status: "success".to_string(),
                            total_pages: progress.page_number,
                            final_total: progress.records_processed,
                        },
                    )
                    .await;
                    break ExtractionOutcome::Completed;
                }
            }
        };

        let summary = ExtractionSummary {
            scan_id: self.scan_id.clone(),
            outcome,
            records_emitted,
            total_records: progress.records_processed,
            pages_fetched,
            page_number: progress.page_number,
            cursor: progress.cursor,
            duration: started.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    async fn checkpoint(&self, progress: &Progress, detail: CheckpointDetail) {
        let checkpoint = Checkpoint::new(
            self.scan_id.clone(),
            progress.records_processed,
            progress.cursor.clone(),
            progress.page_number,
            self.settings.batch_size,
            detail,
        );
        self.recorder.record(&checkpoint).await;
    }

    async fn error_checkpoint(&self, progress: &Progress, error: &EtlError) {
        self.checkpoint(
            progress,
            CheckpointDetail::Error {
                error: error.to_string(),
                error_page: progress.page_number + 1,
                recovery_cursor: progress.cursor.clone(),
            },
        )
        .await;
    }
}
