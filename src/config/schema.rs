//! Configuration schema types
//!
//! This module defines the configuration structure for deal-etl.

use crate::config::SecretString;
use crate::core::extract::DealFilters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main deal-etl configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// HubSpot API connection
    #[serde(default)]
    pub hubspot: HubSpotConfig,

    /// Job identity (tenant, scan)
    #[serde(default)]
    pub job: JobConfig,

    /// Extraction run settings and filters
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Checkpoint persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Output sink settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EtlConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.hubspot.validate()?;
        self.job.validate()?;
        self.extraction.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// HubSpot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotConfig {
    /// Base URL of the HubSpot API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Private app access token
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default, alias = "accessToken")]
    pub access_token: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request-rate ceiling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl HubSpotConfig {
    /// Create a configuration for the given base URL and token with defaults elsewhere
    pub fn new(base_url: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: Some(access_token),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| format!("hubspot.base_url is not a valid URL: {e}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("hubspot.base_url must start with http:// or https://".to_string());
        }

        match &self.access_token {
            Some(token) if !token.expose_secret().is_blank() => {}
            _ => return Err("hubspot.access_token is required".to_string()),
        }

        if self.timeout_seconds == 0 {
            return Err("hubspot.timeout_seconds must be > 0".to_string());
        }

        self.rate_limit.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

impl Default for HubSpotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Request-rate ceiling: `requests` per `period_seconds`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per period
    #[serde(default = "default_rate_limit_requests")]
    pub requests: u32,

    /// Period length in seconds
    #[serde(default = "default_rate_limit_period_seconds")]
    pub period_seconds: u64,
}

impl RateLimitConfig {
    /// Minimum spacing between two request dispatches
    pub fn min_interval(&self) -> Duration {
        if self.requests == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(self.period_seconds) / self.requests
    }

    fn validate(&self) -> Result<(), String> {
        if self.requests == 0 {
            return Err("hubspot.rate_limit.requests must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: default_rate_limit_requests(),
            period_seconds: default_rate_limit_period_seconds(),
        }
    }
}

/// Retry configuration
///
/// Backoff before retry `n` (0-based) is
/// `initial_delay_ms * backoff_multiplier^n` plus up to `max_jitter_ms` of jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, rate-limit waits excluded
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound of the random jitter added to each backoff
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Consecutive 429 responses tolerated for one request
    #[serde(default = "default_max_rate_limit_waits")]
    pub max_rate_limit_waits: u32,

    /// Ceiling on a single `Retry-After` wait
    #[serde(default = "default_max_retry_after_ms")]
    pub max_retry_after_ms: u64,
}

impl RetryConfig {
    /// Backoff before the retry following failed attempt `attempt` (0-based), without jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((self.initial_delay_ms as f64 * factor) as u64)
    }

    /// Longest wait honored for a `Retry-After` header
    pub fn max_retry_after(&self) -> Duration {
        Duration::from_millis(self.max_retry_after_ms)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(format!(
                "hubspot.retry.max_attempts must be between 1 and 10, got {}",
                self.max_attempts
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err("hubspot.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_jitter_ms: default_max_jitter_ms(),
            max_rate_limit_waits: default_max_rate_limit_waits(),
            max_retry_after_ms: default_max_retry_after_ms(),
        }
    }
}

/// Job identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Tenant stamped on every row
    #[serde(default, alias = "organizationId")]
    pub tenant_id: Option<String>,

    /// Scan identifier; generated per run when absent
    #[serde(default)]
    pub scan_id: Option<String>,
}

impl JobConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(scan_id) = &self.scan_id {
            crate::domain::ScanId::new(scan_id.as_str()).map_err(|e| format!("job.scan_id: {e}"))?;
        }
        Ok(())
    }
}

/// Extraction run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Records requested per page (API maximum is 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Persist a progress checkpoint every N completed pages
    #[serde(default = "default_checkpoint_interval_pages")]
    pub checkpoint_interval_pages: u32,

    /// Page ceiling for one run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Properties to request; the default deal property set when absent
    #[serde(default)]
    pub properties: Option<Vec<String>>,

    /// Request archived deals
    #[serde(default)]
    pub archived: bool,

    /// Deal stage allow-list (empty = all)
    #[serde(default, alias = "dealStages")]
    pub deal_stages: Vec<String>,

    /// Pipeline allow-list (empty = all)
    #[serde(default)]
    pub pipelines: Vec<String>,
}

impl ExtractionConfig {
    /// Build the immutable filter set for a run
    pub fn filters(&self) -> DealFilters {
        DealFilters {
            deal_stages: self.deal_stages.iter().cloned().collect(),
            pipelines: self.pipelines.iter().cloned().collect(),
            properties: self.properties.clone(),
            archived: self.archived,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.batch_size) {
            return Err(format!(
                "extraction.batch_size must be between 1 and 100, got {}",
                self.batch_size
            ));
        }
        if self.checkpoint_interval_pages == 0 {
            return Err("extraction.checkpoint_interval_pages must be > 0".to_string());
        }
        if self.max_pages == 0 {
            return Err("extraction.max_pages must be > 0".to_string());
        }
        if let Some(properties) = &self.properties {
            if properties.iter().any(|p| p.trim().is_empty()) {
                return Err("extraction.properties cannot contain empty names".to_string());
            }
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            checkpoint_interval_pages: default_checkpoint_interval_pages(),
            max_pages: default_max_pages(),
            properties: None,
            archived: false,
            deal_stages: vec![],
            pipelines: vec![],
        }
    }
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Enable checkpointing
    #[serde(default = "default_true")]
    pub enable_checkpointing: bool,

    /// Directory holding checkpoint files and pause/cancel markers
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.checkpoint_dir.trim().is_empty() {
            return Err("state.checkpoint_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            enable_checkpointing: true,
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON-lines file receiving transformed deals
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.hubapi.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    "HubSpot-Deals-ETL-Service/1.0".to_string()
}

fn default_rate_limit_requests() -> u32 {
    150
}

fn default_rate_limit_period_seconds() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_jitter_ms() -> u64 {
    1000
}

fn default_max_rate_limit_waits() -> u32 {
    50
}

fn default_max_retry_after_ms() -> u64 {
    300_000
}

fn default_batch_size() -> u32 {
    100
}

fn default_checkpoint_interval_pages() -> u32 {
    5
}

fn default_max_pages() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_checkpoint_dir() -> String {
    ".deal-etl/state".to_string()
}

fn default_output_path() -> String {
    "deals.jsonl".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn valid_hubspot() -> HubSpotConfig {
        HubSpotConfig::new("https://api.hubapi.com", secret_string("pat-test".to_string()))
    }

    #[test]
    fn test_rate_limit_min_interval() {
        let config = RateLimitConfig::default();
        let interval = config.min_interval();
        // 10s / 150 = 66.666ms
        assert_eq!(interval.as_millis(), 66);
        assert!(interval > Duration::from_micros(66_600));
    }

    #[test]
    fn test_retry_backoff_delay() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(retry.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(retry.backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_after_ceiling() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_retry_after(), Duration::from_secs(300));

        let retry: RetryConfig = toml::from_str("max_retry_after_ms = 2500").unwrap();
        assert_eq!(retry.max_retry_after(), Duration::from_millis(2500));
        assert_eq!(retry.max_attempts, 3);
    }

    #[test]
    fn test_hubspot_config_requires_token() {
        let config = HubSpotConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.contains("access_token"));

        let blank = HubSpotConfig::new("https://api.hubapi.com", secret_string(" ".to_string()));
        assert!(blank.validate().is_err());

        assert!(valid_hubspot().validate().is_ok());
    }

    #[test]
    fn test_hubspot_config_rejects_bad_url() {
        let mut config = valid_hubspot();
        config.base_url = "ftp://api.hubapi.com".to_string();
        assert!(config.validate().is_err());

        config.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extraction_batch_size_bounds() {
        let mut config = ExtractionConfig::default();
        assert!(config.validate().is_ok());

        config.batch_size = 101;
        assert!(config.validate().is_err());

        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extraction_filters() {
        let config = ExtractionConfig {
            deal_stages: vec!["closedwon".to_string()],
            pipelines: vec!["default".to_string()],
            archived: true,
            ..Default::default()
        };

        let filters = config.filters();
        assert!(filters.deal_stages.contains("closedwon"));
        assert!(filters.pipelines.contains("default"));
        assert!(filters.archived);
        assert!(filters.properties.is_none());
    }

    #[test]
    fn test_access_token_camel_case_alias() {
        let config: HubSpotConfig = toml::from_str(r#"accessToken = "pat-camel""#).unwrap();
        assert!(config.access_token.is_some());
    }

    #[test]
    fn test_job_config_rejects_bad_scan_id() {
        let job = JobConfig {
            tenant_id: None,
            scan_id: Some("../escape".to_string()),
        };
        assert!(job.validate().is_err());
    }
}
