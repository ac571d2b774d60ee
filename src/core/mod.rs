//! Core business logic for deal-etl.
//!
//! # Modules
//!
//! - [`extract`] - Resumable paginated extraction engine, signals and sinks
//! - [`state`] - Checkpoint model and persistence
//! - [`transform`] - Raw deal to output row mapping
//!
//! # Extraction Workflow
//!
//! 1. **Seed**: start fresh or from a stored checkpoint's resume state
//! 2. **Poll**: check cancel, then pause, before each page
//! 3. **Fetch**: one page from the [`extract::DealSource`]
//! 4. **Transform & filter**: per record, in API order
//! 5. **Emit**: await the sink for every surviving row
//! 6. **Checkpoint**: every N pages, and on every stop
//!
//! # Example
//!
//! ```rust,no_run
//! use deal_etl::adapters::hubspot::HubSpotClient;
//! use deal_etl::config::load_config;
//! use deal_etl::core::extract::{DealExtractor, JsonLinesSink};
//! use deal_etl::domain::ScanId;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("deal-etl.toml")?;
//! let client = Arc::new(HubSpotClient::new(&config.hubspot)?);
//!
//! let mut sink = JsonLinesSink::append(&config.output.path).await?;
//! let summary = DealExtractor::new(client, ScanId::new("scan-1")?)
//!     .with_filters(config.extraction.filters())
//!     .run(None, &mut sink)
//!     .await?;
//! sink.flush().await?;
//!
//! println!("Outcome: {}", summary.outcome);
//! println!("Rows: {}", summary.records_emitted);
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod state;
pub mod transform;
