//! Extraction run summary

use crate::domain::{Cursor, ScanId};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// How a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// End of data reached
    Completed,
    /// Pause requested between pages
    Paused,
    /// Pause requested inside a page
    PausedMidPage,
    /// Cancel requested
    Cancelled,
    /// Run stopped at its page ceiling; resumable
    PageLimitReached,
}

impl ExtractionOutcome {
    /// Whether resuming the scan would fetch more data
    pub fn is_resumable(self) -> bool {
        matches!(
            self,
            Self::Paused | Self::PausedMidPage | Self::PageLimitReached
        )
    }
}

impl fmt::Display for ExtractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::PausedMidPage => "paused_mid_page",
            Self::Cancelled => "cancelled",
            Self::PageLimitReached => "page_limit_reached",
        };
        f.write_str(s)
    }
}

/// Summary of one extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub scan_id: ScanId,

    pub outcome: ExtractionOutcome,

    /// Rows emitted by this run
    pub records_emitted: u64,

    /// Rows emitted across all runs of the scan, as recorded in the last checkpoint
    pub total_records: u64,

    /// Pages fetched by this run
    pub pages_fetched: u32,

    /// Pages completed across all runs of the scan
    pub page_number: u32,

    /// Cursor a resumed run would start from
    pub cursor: Option<Cursor>,

    /// Wall-clock duration of this run
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
}

impl ExtractionSummary {
    /// Whether the run reached end of data
    pub fn is_completed(&self) -> bool {
        self.outcome == ExtractionOutcome::Completed
    }

    /// Emitted rows per second of wall time
    pub fn records_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.records_emitted as f64 / secs
    }

    /// Log the summary at info level
    pub fn log(&self) {
        tracing::info!(
            scan_id = %self.scan_id,
            outcome = %self.outcome,
            records_emitted = self.records_emitted,
            total_records = self.total_records,
            pages_fetched = self.pages_fetched,
            page_number = self.page_number,
            duration_ms = self.duration.as_millis() as u64,
            records_per_second = self.records_per_second(),
            "Extraction run finished"
        );
    }
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
