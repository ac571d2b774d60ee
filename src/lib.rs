// deal-etl - HubSpot deals extraction
// Copyright (c) 2025 Deal ETL Contributors
// Licensed under the MIT License

//! # deal-etl - HubSpot CRM deals extraction
//!
//! deal-etl walks the HubSpot CRM v3 deals collection page by page, flattens
//! each deal into an analytics row and hands the rows to a downstream sink.
//! Runs are resumable: progress is recorded as checkpoints that carry the
//! pagination cursor, and a run can be paused or cancelled between records.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Extraction engine, deal transform, checkpoint state
//! - [`adapters`] - HubSpot API client (rate limiting, retries)
//! - [`domain`] - Identifiers, deal records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deal_etl::adapters::hubspot::HubSpotClient;
//! use deal_etl::config::load_config;
//! use deal_etl::core::extract::{DealExtractor, ExtractionSettings};
//! use deal_etl::domain::{ScanId, TransformedDeal};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("deal-etl.toml")?;
//!     let client = HubSpotClient::new(&config.hubspot)?;
//!
//!     let extractor = DealExtractor::new(Arc::new(client), ScanId::new("nightly")?)
//!         .with_filters(config.extraction.filters())
//!         .with_settings(ExtractionSettings::from(&config.extraction));
//!
//!     let mut rows: Vec<TransformedDeal> = Vec::new();
//!     let summary = extractor.run(None, &mut rows).await?;
//!     println!("{} deals, outcome {}", rows.len(), summary.outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Library operations return [`domain::Result`], whose error is
//! [`domain::EtlError`]. Remote failures keep their own taxonomy in
//! [`domain::RemoteError`] so callers can tell a missing deal from an
//! exhausted retry budget.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
