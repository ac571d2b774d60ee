//! Check command implementation
//!
//! Probes the HubSpot endpoints the extractor depends on and prints a
//! readiness report.

use crate::adapters::hubspot::{ConnectionReport, HubSpotClient};
use crate::config::load_config;
use clap::Args;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    /// Execute the check command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking HubSpot connection");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let client = match HubSpotClient::new(&config.hubspot) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to create HubSpot client");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let report = client.test_connection().await;
        tracing::info!(
            credentials_valid = report.credentials_valid,
            deals_accessible = report.deals_accessible,
            properties_accessible = report.properties_accessible,
            pipelines_accessible = report.pipelines_accessible,
            "Connection check finished"
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&config.hubspot.base_url, &report);
        }

        Ok(if report.is_ready() { 0 } else { 4 })
    }
}

fn print_report(base_url: &str, report: &ConnectionReport) {
    println!("🔍 HubSpot connection check: {base_url}");
    println!();
    println!("  Credentials valid:     {}", mark(report.credentials_valid));
    println!("  API reachable:         {}", mark(report.api_reachable));
    println!("  Deals accessible:      {}", mark(report.deals_accessible));
    println!("  Properties accessible: {}", mark(report.properties_accessible));
    println!("  Pipelines accessible:  {}", mark(report.pipelines_accessible));

    if let Some(info) = &report.rate_limit_info {
        println!(
            "  Rate limit:            {} requests / {}s ({:.1} req/s)",
            info.limit, info.period_seconds, info.requests_per_second
        );
    }

    if let Some(error) = &report.error {
        println!();
        println!("  Error: {error}");
    }
    println!();
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}
