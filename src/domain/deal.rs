//! Deal models
//!
//! Raw deals as returned by the CRM list endpoint, one page of them, and the
//! normalized row emitted downstream.

use super::ids::{Cursor, ScanId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Tag stamped on every emitted row
pub const SOURCE_SERVICE: &str = "hubspot_deals";

/// A deal exactly as the CRM returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDeal {
    /// Remote deal identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Property map (all values are strings or null on the wire)
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub properties: Map<String, Value>,

    /// Archived flag
    #[serde(default)]
    pub archived: Option<bool>,
}

impl RawDeal {
    /// Build a raw deal from an id and a property map
    pub fn new(id: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            properties,
            archived: None,
        }
    }
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of the list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealPage {
    /// Raw records in API order
    pub results: Vec<RawDeal>,

    /// Cursor for the following page; `None` at end of data
    pub next_cursor: Option<Cursor>,
}

impl DealPage {
    /// Create a page
    pub fn new(results: Vec<RawDeal>, next_cursor: Option<Cursor>) -> Self {
        Self {
            results,
            next_cursor,
        }
    }

    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// A normalized deal row
///
/// Produced once per qualifying raw record by
/// [`crate::core::transform::transform_deal`] and handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedDeal {
    /// Freshly generated row identifier
    pub id: Uuid,
    pub deal_id: Option<String>,
    pub deal_name: Option<String>,
    pub amount: Option<f64>,
    pub deal_stage: Option<String>,
    pub close_date: Option<DateTime<Utc>>,
    pub pipeline: Option<String>,
    pub deal_type: Option<String>,
    pub hubspot_owner_id: Option<String>,
    /// Stage probability as a fraction (0.0 - 1.0)
    pub deal_stage_probability: Option<f64>,
    pub description: Option<String>,
    pub analytics_source: Option<String>,
    pub num_associated_contacts: i64,
    pub priority: Option<String>,
    pub next_step: Option<String>,
    pub forecast_amount: Option<f64>,
    pub forecast_probability: Option<f64>,
    pub hubspot_created_at: Option<DateTime<Utc>>,
    pub hubspot_updated_at: Option<DateTime<Utc>>,
    pub archived: bool,
    /// Untouched property map for forward compatibility
    pub raw_properties: Map<String, Value>,

    #[serde(rename = "_extracted_at")]
    pub extracted_at: DateTime<Utc>,
    #[serde(rename = "_scan_id")]
    pub scan_id: ScanId,
    #[serde(rename = "_tenant_id")]
    pub tenant_id: Option<TenantId>,
    /// 1-based page the record came from
    #[serde(rename = "_page_number")]
    pub page_number: u32,
    #[serde(rename = "_source_service")]
    pub source_service: String,
}
