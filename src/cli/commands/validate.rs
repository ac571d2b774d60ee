//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the deal-etl configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let extraction = &config.extraction;
        let list = |items: &[String]| {
            if items.is_empty() {
                "All".to_string()
            } else {
                items.join(", ")
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  HubSpot URL: {}", config.hubspot.base_url);
        println!(
            "  Rate Limit: {} requests / {}s",
            config.hubspot.rate_limit.requests, config.hubspot.rate_limit.period_seconds
        );
        println!("  Max Attempts: {}", config.hubspot.retry.max_attempts);
        println!(
            "  Tenant: {}",
            config.job.tenant_id.as_deref().unwrap_or("(none)")
        );
        println!("  Batch Size: {}", extraction.batch_size);
        println!(
            "  Checkpoint Every: {} page(s)",
            extraction.checkpoint_interval_pages
        );
        println!("  Max Pages Per Run: {}", extraction.max_pages);
        println!("  Archived: {}", extraction.archived);
        println!("  Deal Stages: {}", list(&extraction.deal_stages));
        println!("  Pipelines: {}", list(&extraction.pipelines));
        println!(
            "  Properties: {}",
            extraction
                .properties
                .as_deref()
                .map_or_else(|| "(default set)".to_string(), |p| p.join(", "))
        );
        println!(
            "  Checkpointing: {} ({})",
            config.state.enable_checkpointing, config.state.checkpoint_dir
        );
        println!("  Output: {}", config.output.path);
        println!();

        Ok(0)
    }
}
