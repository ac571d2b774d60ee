//! Resumable paginated extraction
//!
//! - [`engine`] - the page-walking state machine ([`DealExtractor`])
//! - [`signals`] - pause/cancel predicates polled by the engine
//! - [`sink`] - downstream destinations for transformed deals
//! - [`summary`] - run outcome reporting
//!
//! The engine depends on the remote API only through [`DealSource`].

pub mod engine;
pub mod signals;
pub mod sink;
pub mod summary;

pub use engine::{DealExtractor, ExtractionSettings};
pub use signals::{CombinedSignals, MarkerFileSignals, NoSignals, ScanControl, ScanSignals};
pub use sink::{ChannelSink, DealSink, JsonLinesSink};
pub use summary::{ExtractionOutcome, ExtractionSummary};

use crate::domain::{Cursor, DealPage, Result, TransformedDeal};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// A paginated source of raw deals
#[async_trait]
pub trait DealSource: Send + Sync {
    /// Fetch the page that starts at `after` (`None` for the first page)
    async fn fetch_page(
        &self,
        limit: u32,
        after: Option<&Cursor>,
        properties: Option<&[String]>,
        archived: bool,
    ) -> Result<DealPage>;
}

/// Immutable per-run filter set
///
/// Stage and pipeline allow-lists are applied to transformed rows (both must
/// pass); `properties` and `archived` shape the page request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealFilters {
    /// Deal stage allow-list, empty means all
    pub deal_stages: BTreeSet<String>,

    /// Pipeline allow-list, empty means all
    pub pipelines: BTreeSet<String>,

    /// Properties to request
    pub properties: Option<Vec<String>>,

    /// Request archived deals
    pub archived: bool,
}

impl DealFilters {
    /// Whether a row passes both allow-lists
    pub fn matches(&self, deal: &TransformedDeal) -> bool {
        allowed(&self.deal_stages, deal.deal_stage.as_deref())
            && allowed(&self.pipelines, deal.pipeline.as_deref())
    }
}

fn allowed(allow_list: &BTreeSet<String>, value: Option<&str>) -> bool {
    if allow_list.is_empty() {
        return true;
    }
    value.is_some_and(|v| allow_list.contains(v))
}
