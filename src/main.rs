// deal-etl - HubSpot deals extraction
// Copyright (c) 2025 Deal ETL Contributors
// Licensed under the MIT License

use clap::Parser;
use deal_etl::cli::commands::signal::SignalKind;
use deal_etl::cli::{Cli, Commands};
use deal_etl::config::load_logging_config;
use deal_etl::core::extract::ScanControl;
use deal_etl::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Optional; a missing .env is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Only the [logging] table is read here so a broken config still logs
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let logging_config = load_logging_config(&cli.config);
    let logging_guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "deal-etl - HubSpot deals extraction"
    );

    // Signals pause the scan; the run stops at its next check and stays resumable
    let control = ScanControl::new();
    let handler_control = control.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind as UnixSignal};
            let mut sigterm = match signal(UnixSignal::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), pausing extraction");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, pausing extraction");
                }
            }
            println!("\n⚠️  Signal received, pausing after the current record...");
            handler_control.request_pause();
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), pausing extraction");
                println!("\n⚠️  Signal received, pausing after the current record...");
                handler_control.request_pause();
            }
        }
    });

    let exit_code = match execute_command(&cli, control).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e:#}");
            5
        }
    };

    // process::exit skips destructors; flush file logs first
    drop(logging_guard);
    process::exit(exit_code);
}

async fn execute_command(cli: &Cli, control: ScanControl) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Extract(args) => args.execute(&cli.config, control).await,
        Commands::Check(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Pause(args) => args.execute(&cli.config, SignalKind::Pause).await,
        Commands::Cancel(args) => args.execute(&cli.config, SignalKind::Cancel).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
