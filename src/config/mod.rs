//! Configuration management for deal-etl.
//!
//! deal-etl uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DEAL_ETL_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [hubspot]
//! access_token = "${HUBSPOT_ACCESS_TOKEN}"
//!
//! [hubspot.rate_limit]
//! requests = 150
//! period_seconds = 10
//!
//! [job]
//! tenant_id = "org-42"
//!
//! [extraction]
//! deal_stages = ["closedwon"]
//!
//! [state]
//! checkpoint_dir = ".deal-etl/state"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use deal_etl::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("deal-etl.toml")?;
//! println!("HubSpot URL: {}", config.hubspot.base_url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_logging_config};
pub use schema::{
    ApplicationConfig, EtlConfig, ExtractionConfig, HubSpotConfig, JobConfig, LoggingConfig,
    OutputConfig, RateLimitConfig, RetryConfig, StateConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
