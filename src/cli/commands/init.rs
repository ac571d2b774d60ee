//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "deal-etl.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing deal-etl configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Create a HubSpot private app with the crm.objects.deals.read scope");
                println!("  2. Put its token in .env as HUBSPOT_ACCESS_TOKEN=...");
                println!("  3. Validate configuration: deal-etl validate-config");
                println!("  4. Check API access: deal-etl check");
                println!("  5. Run extraction: deal-etl extract");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# deal-etl configuration
# HubSpot CRM deals extraction

[application]
log_level = "info"

[hubspot]
access_token = "${HUBSPOT_ACCESS_TOKEN}"

[job]
# tenant_id = "org-42"

[extraction]
batch_size = 100
checkpoint_interval_pages = 5
max_pages = 1000

[state]
enable_checkpointing = true
checkpoint_dir = ".deal-etl/state"

[output]
path = "deals.jsonl"

[logging]
local_enabled = false
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# deal-etl configuration
# HubSpot CRM deals extraction
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any DEAL_ETL_<SECTION>_<KEY> environment variable overrides the file.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# HubSpot API
# ============================================================================
[hubspot]
# API root
base_url = "https://api.hubapi.com"

# Private app access token (use an environment variable)
access_token = "${HUBSPOT_ACCESS_TOKEN}"

# Per-request timeout in seconds
timeout_seconds = 30

# User-Agent sent with every request
user_agent = "HubSpot-Deals-ETL-Service/1.0"

[hubspot.rate_limit]
# At most `requests` requests per `period_seconds`, evenly spaced
requests = 150
period_seconds = 10

[hubspot.retry]
# Attempts for transport errors and 5xx responses
max_attempts = 3

# Backoff: initial_delay_ms * backoff_multiplier^(attempt - 1), plus jitter
initial_delay_ms = 1000
backoff_multiplier = 2.0
max_jitter_ms = 1000

# 429 responses wait for Retry-After without using an attempt; this caps
# how many such waits one request may take
max_rate_limit_waits = 50

# Longest single Retry-After wait honored, in milliseconds
max_retry_after_ms = 300000

# ============================================================================
# Job Identity
# ============================================================================
[job]
# Tenant stamped on every extracted row
# tenant_id = "org-42"

# Fixed scan id; a new one is generated per run when absent
# scan_id = "nightly"

# ============================================================================
# Extraction
# ============================================================================
[extraction]
# Records per page (1-100)
batch_size = 100

# Persist a progress checkpoint every N pages
checkpoint_interval_pages = 5

# Page ceiling for one run; the scan pauses there and can be resumed
max_pages = 1000

# Properties to request (default set when omitted)
# properties = ["dealname", "amount", "dealstage", "pipeline", "closedate"]

# Extract archived deals instead of active ones
archived = false

# Allow-lists applied to extracted rows (empty = all)
deal_stages = []
pipelines = []

# ============================================================================
# Checkpoints
# ============================================================================
[state]
# Record checkpoints so interrupted scans can be resumed
enable_checkpointing = true

# Checkpoint files and pause/cancel markers live here
checkpoint_dir = ".deal-etl/state"

# ============================================================================
# Output
# ============================================================================
[output]
# JSON-lines file the extracted deals are appended to
path = "deals.jsonl"

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "logs"

# Rotation: hourly, daily or never
local_rotation = "daily"
"#
        .to_string()
    }
}
