//! Seaport sales collector.
//!
//! This binary pages through the Seaport subgraph until the requested number
//! of trades is collected, checkpointing progress so an interrupted run
//! resumes, then writes the dataset, a representative sample and summary
//! tables as CSV.

mod config;
mod error;
mod pipeline;

use std::process::exit;

use chrono::{Local, Utc};
use clap::Parser;
use tracing::error;

use config::{CliConfig, EnvConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let result = if cli_config.utc {
        pipeline::run(&env_config, &cli_config, Utc).await
    } else {
        pipeline::run(&env_config, &cli_config, Local).await
    };

    if let Err(e) = result {
        error!(%e, "Sales collection failed");
        exit(1);
    }
}
