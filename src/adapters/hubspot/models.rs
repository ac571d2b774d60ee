//! HubSpot CRM v3 wire models
//!
//! Response envelopes for the deals, properties and pipelines endpoints,
//! plus the connection report produced by
//! [`HubSpotClient::test_connection`](super::HubSpotClient::test_connection).

use crate::domain::{Cursor, DealPage, RawDeal};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Properties requested when the caller does not choose any
pub const DEFAULT_DEAL_PROPERTIES: &[&str] = &[
    "dealname",
    "amount",
    "dealstage",
    "closedate",
    "pipeline",
    "dealtype",
    "hubspot_owner_id",
    "description",
    "createdate",
    "hs_lastmodifieddate",
    "hs_deal_stage_probability",
];

/// Largest page the list endpoint serves
pub const MAX_PAGE_SIZE: u32 = 100;

/// `GET /crm/v3/objects/deals` response
#[derive(Debug, Clone, Deserialize)]
pub struct ListDealsResponse {
    #[serde(default)]
    pub results: Vec<RawDeal>,

    #[serde(default)]
    pub paging: Option<Paging>,
}

/// Paging envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<NextPage>,
}

/// Pointer to the following page
#[derive(Debug, Clone, Deserialize)]
pub struct NextPage {
    #[serde(default)]
    pub after: Option<String>,

    #[serde(default)]
    pub link: Option<String>,
}

impl ListDealsResponse {
    /// `paging.next.after`, ignoring empty strings
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .and_then(|n| n.after.as_deref())
            .filter(|after| !after.is_empty())
            .map(Cursor::new)
    }
}

impl From<ListDealsResponse> for DealPage {
    fn from(response: ListDealsResponse) -> Self {
        let next_cursor = response.next_cursor();
        DealPage::new(response.results, next_cursor)
    }
}

/// Generic `{ "results": [...] }` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A deal property definition (`/crm/v3/properties/deals`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default, rename = "type")]
    pub property_type: Option<String>,

    #[serde(default)]
    pub field_type: Option<String>,

    #[serde(default)]
    pub group_name: Option<String>,

    /// Remaining attributes, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A deal pipeline (`/crm/v3/pipelines/deals`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub display_order: Option<i64>,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub stages: Vec<PipelineStage>,
}

/// A stage within a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub id: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub display_order: Option<i64>,

    /// Stage metadata such as `probability` and `isClosed`
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Configured request-rate ceiling, as reported by `test_connection`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub period_seconds: u64,
    pub requests_per_second: f64,
}

/// Outcome of probing every endpoint the extractor depends on
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionReport {
    pub credentials_valid: bool,
    pub api_reachable: bool,
    pub deals_accessible: bool,
    pub properties_accessible: bool,
    pub pipelines_accessible: bool,
    pub rate_limit_info: Option<RateLimitInfo>,
    pub error: Option<String>,
}

impl ConnectionReport {
    /// Whether deals can be extracted with these credentials
    pub fn is_ready(&self) -> bool {
        self.credentials_valid && self.deals_accessible
    }
}
