//! Checkpoint model
//!
//! A checkpoint is an immutable snapshot of an extraction run. `cursor`,
//! `page_number` and `records_processed` are always written together so the
//! three agree: `cursor` fetches page `page_number + 1`, and
//! `records_processed` counts rows emitted before that page (or, for a
//! mid-page pause, including the rows of the partial page).

use crate::domain::{Cursor, ScanId, SOURCE_SERVICE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason recorded for an operator pause
pub const PAUSE_USER_REQUESTED: &str = "user_requested";

/// Reason recorded for an operator pause that interrupted a page
pub const PAUSE_USER_REQUESTED_MID_PAGE: &str = "user_requested_mid_page";

/// Reason recorded when a run stops at its page ceiling
pub const PAUSE_PAGE_LIMIT_REACHED: &str = "page_limit_reached";

/// Reason recorded for an operator cancel
pub const CANCEL_USER_REQUESTED: &str = "user_requested";

/// Checkpoint phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointPhase {
    /// Periodic progress snapshot
    Processing,
    /// Stopped between pages
    Paused,
    /// Stopped inside a page
    PausedMidPage,
    /// Stopped by a cancel request
    Cancelled,
    /// End of data reached
    Completed,
    /// Stopped by a fetch failure
    Error,
}

impl fmt::Display for CheckpointPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Processing => "processing",
            Self::Paused => "paused",
            Self::PausedMidPage => "paused_mid_page",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Phase-specific payload
///
/// Serialized as `"phase": "<name>", "checkpoint_data": {...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "checkpoint_data", rename_all = "snake_case")]
pub enum CheckpointDetail {
    Processing {
        pages_processed: u32,
        last_page_records: u64,
        has_more_pages: bool,
    },
    Paused {
        pause_reason: String,
        paused_at_page: u32,
        paused_at: DateTime<Utc>,
    },
    PausedMidPage {
        pause_reason: String,
        paused_at_page: u32,
        records_completed_in_page: u64,
        paused_at: DateTime<Utc>,
    },
    Cancelled {
        cancellation_reason: String,
        cancelled_at_page: u32,
    },
    Completed {
        completion_status: String,
        total_pages: u32,
        final_total: u64,
    },
    Error {
        error: String,
        error_page: u32,
        recovery_cursor: Option<Cursor>,
    },
}

impl CheckpointDetail {
    /// Phase tag of this payload
    pub fn phase(&self) -> CheckpointPhase {
        match self {
            Self::Processing { .. } => CheckpointPhase::Processing,
            Self::Paused { .. } => CheckpointPhase::Paused,
            Self::PausedMidPage { .. } => CheckpointPhase::PausedMidPage,
            Self::Cancelled { .. } => CheckpointPhase::Cancelled,
            Self::Completed { .. } => CheckpointPhase::Completed,
            Self::Error { .. } => CheckpointPhase::Error,
        }
    }
}

/// Snapshot of an extraction run
///
/// # Examples
///
/// ```
/// use deal_etl::core::state::{Checkpoint, CheckpointDetail, CheckpointPhase};
/// use deal_etl::domain::{Cursor, ScanId};
///
/// let checkpoint = Checkpoint::new(
///     ScanId::new("scan-1").unwrap(),
///     500,
///     Some(Cursor::new("c5")),
///     5,
///     100,
///     CheckpointDetail::Processing {
///         pages_processed: 5,
///         last_page_records: 100,
///         has_more_pages: true,
///     },
/// );
///
/// assert_eq!(checkpoint.phase(), CheckpointPhase::Processing);
/// let resume = checkpoint.resume_state().unwrap();
/// assert_eq!(resume.page_number, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Run this checkpoint belongs to
    pub scan_id: ScanId,

    /// Rows emitted so far, across all runs of this scan
    pub records_processed: u64,

    /// Cursor to resume from; `None` means "from the start" (or end of data when completed)
    pub cursor: Option<Cursor>,

    /// Pages fully completed
    pub page_number: u32,

    /// Page size requested
    pub batch_size: u32,

    #[serde(flatten)]
    pub detail: CheckpointDetail,

    /// Source tag, always `hubspot_deals`
    pub service: String,

    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time
    pub fn new(
        scan_id: ScanId,
        records_processed: u64,
        cursor: Option<Cursor>,
        page_number: u32,
        batch_size: u32,
        detail: CheckpointDetail,
    ) -> Self {
        Self {
            scan_id,
            records_processed,
            cursor,
            page_number,
            batch_size,
            detail,
            service: SOURCE_SERVICE.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Phase of this checkpoint
    pub fn phase(&self) -> CheckpointPhase {
        self.detail.phase()
    }

    /// Whether the scan reached end of data
    pub fn is_completed(&self) -> bool {
        self.phase() == CheckpointPhase::Completed
    }

    /// Seed for resuming the scan, `None` once it has completed
    pub fn resume_state(&self) -> Option<ResumeState> {
        if self.is_completed() {
            return None;
        }
        Some(ResumeState {
            cursor: self.cursor.clone(),
            page_number: self.page_number,
            records_processed: self.records_processed,
        })
    }
}

/// Where a resumed run starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    pub cursor: Option<Cursor>,
    pub page_number: u32,
    pub records_processed: u64,
}
