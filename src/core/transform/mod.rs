//! Deal transformation
//!
//! Maps a raw CRM deal onto the normalized [`TransformedDeal`] row. The
//! mapping is total: malformed properties become `None` (or `0` for the
//! contact count) and the row is still produced.

pub mod parse;

use crate::domain::{RawDeal, ScanId, TenantId, TransformedDeal, SOURCE_SERVICE};
use chrono::Utc;
use uuid::Uuid;

/// Transform a raw deal into an output row
///
/// `page_number` is the 1-based page the record was fetched on.
///
/// # Examples
///
/// ```
/// use deal_etl::core::transform::transform_deal;
/// use deal_etl::domain::{RawDeal, ScanId};
/// use serde_json::json;
///
/// let properties = json!({"dealname": "Acme", "amount": "5000.00"});
/// let raw = RawDeal::new("123", properties.as_object().unwrap().clone());
/// let scan_id = ScanId::new("scan-1").unwrap();
///
/// let row = transform_deal(&raw, &scan_id, None, 1);
/// assert_eq!(row.deal_name.as_deref(), Some("Acme"));
/// assert_eq!(row.amount, Some(5000.0));
/// ```
pub fn transform_deal(
    raw: &RawDeal,
    scan_id: &ScanId,
    tenant_id: Option<&TenantId>,
    page_number: u32,
) -> TransformedDeal {
    let props = &raw.properties;

    TransformedDeal {
        id: Uuid::new_v4(),
        deal_id: raw.id.clone(),
        deal_name: parse::text(props, "dealname"),
        amount: parse::float(props, "amount"),
        deal_stage: parse::text(props, "dealstage"),
        close_date: parse::timestamp(props, "closedate"),
        pipeline: parse::text(props, "pipeline"),
        deal_type: parse::text(props, "dealtype"),
        hubspot_owner_id: parse::text(props, "hubspot_owner_id"),
        // Percent on the wire, fraction in the row
        deal_stage_probability: parse::float(props, "hs_deal_stage_probability")
            .map(|p| p / 100.0),
        description: parse::text(props, "description"),
        analytics_source: parse::text(props, "hs_analytics_source"),
        num_associated_contacts: parse::count(props, "num_associated_contacts"),
        priority: parse::text(props, "hs_priority"),
        next_step: parse::text(props, "hs_next_step"),
        forecast_amount: parse::float(props, "hs_forecast_amount"),
        forecast_probability: parse::float(props, "hs_forecast_probability"),
        hubspot_created_at: parse::timestamp(props, "createdate"),
        hubspot_updated_at: parse::timestamp(props, "hs_lastmodifieddate"),
        archived: raw.archived.unwrap_or(false),
        raw_properties: props.clone(),
        extracted_at: Utc::now(),
        scan_id: scan_id.clone(),
        tenant_id: tenant_id.cloned(),
        page_number,
        source_service: SOURCE_SERVICE.to_string(),
    }
}
