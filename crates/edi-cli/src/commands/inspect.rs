//! Implementation of the `edi inspect` command.

use clap::ValueEnum;

use crate::client::{CliError, EdiClient};

/// Output format for inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Column-aligned table.
    Column,
    /// JSON report for machine consumption.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column => write!(f, "column"),
            Self::Json => write!(f, "json"),
        }
    }
}

pub async fn run(
    client: &EdiClient,
    enclave: &str,
    model_id: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let report = client.inspect(enclave, model_id).await?;

    match format {
        OutputFormat::Column => {
            if report.is_empty() {
                println!("-- cannot find any model deployments --");
            } else {
                print!("{}", report.render_table());
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Protocol(e.to_string()))?;
            println!("{json}");
        }
    }

    Ok(())
}
