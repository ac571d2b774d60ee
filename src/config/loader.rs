//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{EtlConfig, LoggingConfig};
use super::secret::secret_string;
use crate::domain::errors::EtlError;
use crate::domain::result::Result;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into EtlConfig
/// 4. Applies environment variable overrides (DEAL_ETL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`EtlError::Configuration`] if the file cannot be read or parsed,
/// a referenced environment variable is missing, or validation fails
/// (including a missing access token).
///
/// # Examples
///
/// ```no_run
/// use deal_etl::config::loader::load_config;
///
/// let config = load_config("deal-etl.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EtlConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EtlError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EtlError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: EtlConfig = toml::from_str(&contents)
        .map_err(|e| EtlError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        EtlError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Reads only the `[logging]` table of a configuration file
///
/// Used at startup, before the full configuration is loaded, so that a
/// broken `[hubspot]` section does not prevent logging from coming up.
/// Any problem yields the default logging configuration.
pub fn load_logging_config(path: impl AsRef<Path>) -> LoggingConfig {
    let Ok(contents) = fs::read_to_string(path.as_ref()) else {
        return LoggingConfig::default();
    };

    toml::from_str::<toml::Value>(&contents)
        .ok()
        .and_then(|value| value.get("logging").cloned())
        .and_then(|logging| LoggingConfig::deserialize(logging).ok())
        .unwrap_or_default()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(EtlError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Applies environment variable overrides using DEAL_ETL_* prefix
///
/// Environment variables follow the pattern: DEAL_ETL_<SECTION>_<KEY>
/// For example: DEAL_ETL_HUBSPOT_ACCESS_TOKEN, DEAL_ETL_JOB_TENANT_ID
fn apply_env_overrides(config: &mut EtlConfig) {
    if let Ok(val) = std::env::var("DEAL_ETL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // HubSpot overrides
    if let Ok(val) = std::env::var("DEAL_ETL_HUBSPOT_BASE_URL") {
        config.hubspot.base_url = val;
    }
    if let Ok(val) = std::env::var("DEAL_ETL_HUBSPOT_ACCESS_TOKEN") {
        config.hubspot.access_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("DEAL_ETL_HUBSPOT_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.hubspot.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("DEAL_ETL_HUBSPOT_RATE_LIMIT_REQUESTS") {
        if let Ok(requests) = val.parse() {
            config.hubspot.rate_limit.requests = requests;
        }
    }
    if let Ok(val) = std::env::var("DEAL_ETL_HUBSPOT_RETRY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.hubspot.retry.max_attempts = attempts;
        }
    }

    // Job overrides
    if let Ok(val) = std::env::var("DEAL_ETL_JOB_TENANT_ID") {
        config.job.tenant_id = Some(val);
    }
    if let Ok(val) = std::env::var("DEAL_ETL_JOB_SCAN_ID") {
        config.job.scan_id = Some(val);
    }

    // Extraction overrides
    if let Ok(val) = std::env::var("DEAL_ETL_EXTRACTION_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.extraction.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("DEAL_ETL_EXTRACTION_MAX_PAGES") {
        if let Ok(pages) = val.parse() {
            config.extraction.max_pages = pages;
        }
    }
    if let Ok(val) = std::env::var("DEAL_ETL_EXTRACTION_ARCHIVED") {
        config.extraction.archived = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("DEAL_ETL_EXTRACTION_DEAL_STAGES") {
        config.extraction.deal_stages = split_list(&val);
    }
    if let Ok(val) = std::env::var("DEAL_ETL_EXTRACTION_PIPELINES") {
        config.extraction.pipelines = split_list(&val);
    }

    // State overrides
    if let Ok(val) = std::env::var("DEAL_ETL_STATE_ENABLE_CHECKPOINTING") {
        config.state.enable_checkpointing = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("DEAL_ETL_STATE_CHECKPOINT_DIR") {
        config.state.checkpoint_dir = val;
    }

    // Output overrides
    if let Ok(val) = std::env::var("DEAL_ETL_OUTPUT_PATH") {
        config.output.path = val;
    }
}
