//! Refresh trigger command

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{print_json, print_success, print_warning, OutputFormat};

/// Ask the service to start a refresh
pub async fn trigger_refresh(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let ack = client.refresh().await?;

    match format {
        OutputFormat::Json => print_json(&ack),
        OutputFormat::Table => {
            if ack.status == "started" {
                print_success(&ack.message);
            } else {
                print_warning(&ack.message);
            }
        }
    }

    Ok(())
}
