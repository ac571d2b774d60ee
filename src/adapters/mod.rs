//! External system integrations for deal-etl.
//!
//! - [`hubspot`] - HubSpot CRM v3 deals API
//!
//! # Design Pattern
//!
//! Adapters isolate remote systems behind the seams the core depends on.
//! [`hubspot::HubSpotClient`] implements [`crate::core::extract::DealSource`],
//! so the extraction engine can be driven by an in-memory source in tests.
//!
//! ```rust,no_run
//! use deal_etl::adapters::hubspot::HubSpotClient;
//! use deal_etl::config::{secret_string, HubSpotConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubSpotConfig::new(
//!     "https://api.hubapi.com",
//!     secret_string(std::env::var("HUBSPOT_ACCESS_TOKEN")?),
//! );
//!
//! let client = HubSpotClient::new(&config)?;
//! let report = client.test_connection().await;
//! println!("ready: {}", report.is_ready());
//! # Ok(())
//! # }
//! ```

pub mod hubspot;
