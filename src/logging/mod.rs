//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Human-readable console output on stderr
//! - Optional JSON file output with daily/hourly rotation
//! - Level from configuration, overridable with `RUST_LOG`
//!
//! Library code only emits events (`tracing::info!(scan_id = %id, ...)`);
//! installing a subscriber is left to the binary.
//!
//! # Example
//!
//! ```no_run
//! use deal_etl::logging::init_logging;
//! use deal_etl::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(scan_id = "scan-1", "Extraction started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
