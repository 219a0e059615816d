//! Pod inventory CLI
//!
//! A command-line tool for browsing the multi-cluster pod inventory and
//! triggering refreshes.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::PodFilters;
use commands::{pods, refresh};

/// Pod inventory CLI
#[derive(Parser)]
#[command(name = "podinv")]
#[command(author, version, about = "CLI for the multi-cluster pod inventory", long_about = None)]
pub struct Cli {
    /// Inventory service URL (can also be set via PODINV_API_URL env var)
    #[arg(long, env = "PODINV_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pods from the current snapshot
    Pods {
        /// Filter by data center (exact, case-insensitive)
        #[arg(long)]
        data_center: Option<String>,

        /// Filter by namespace (exact, case-insensitive)
        #[arg(long, short)]
        namespace: Option<String>,

        /// Filter by application name (substring, case-insensitive)
        #[arg(long, short)]
        app: Option<String>,

        /// Filter by pod status, e.g. Running or Pending
        #[arg(long, short)]
        status: Option<String>,
    },

    /// Show the values available for each filter
    Filters,

    /// Trigger a data refresh
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Pods {
            data_center,
            namespace,
            app,
            status,
        } => {
            let filters = PodFilters {
                data_center,
                namespace,
                app_name: app,
                pod_status: status,
            };
            pods::list_pods(&client, filters, cli.format).await?;
        }
        Commands::Filters => {
            pods::show_filters(&client, cli.format).await?;
        }
        Commands::Refresh => {
            refresh::trigger_refresh(&client, cli.format).await?;
        }
    }

    Ok(())
}
