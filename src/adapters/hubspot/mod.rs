//! HubSpot CRM adapter
//!
//! - [`client`] - rate-limited, retrying client for the deals API
//! - [`models`] - wire envelopes and the connection report
//! - [`rate_limit`] - dispatch spacing

pub mod client;
pub mod models;
pub mod rate_limit;

pub use client::HubSpotClient;
pub use models::{
    ConnectionReport, Pipeline, PipelineStage, PropertyDefinition, RateLimitInfo,
    DEFAULT_DEAL_PROPERTIES, MAX_PAGE_SIZE,
};
pub use rate_limit::RateLimiter;
