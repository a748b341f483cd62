//! EDI CLI - manage model deployments in enclaves.

mod client;
mod commands;

use clap::{Parser, Subcommand};

use client::EdiClient;
use commands::inspect::OutputFormat;

#[derive(Parser)]
#[command(name = "edi")]
#[command(about = "Manage model deployments in enclaves")]
#[command(version)]
struct Cli {
    /// Control service base URL
    #[arg(long, env = "EDI_URL", default_value = "http://localhost:8085", global = true)]
    url: String,

    /// Enclave to operate on
    #[arg(long, env = "EDI_ENCLAVE", default_value = "default", global = true)]
    enclave: String,

    /// Overall operation deadline in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a model image into the enclave
    Deploy {
        /// Image reference to deploy
        image: String,

        /// Count of instances
        #[arg(long, default_value_t = 1)]
        scale: u32,
    },

    /// Remove a model's deployments from the enclave
    Undeploy {
        /// Model ID
        model_id: String,

        /// Restrict removal to one version
        #[arg(long)]
        model_version: Option<String>,
    },

    /// Change the count of model replicas
    Scale {
        /// Model ID
        model_id: String,

        /// New count of replicas
        scale: u32,

        /// Restrict the change to one version
        #[arg(long)]
        model_version: Option<String>,
    },

    /// Get information about currently deployed models
    Inspect {
        /// Restrict the report to one model ID
        #[arg(long)]
        model_id: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Column)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let client = match EdiClient::new(&cli.url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let result = client::with_deadline(
        cli.timeout,
        run_command(&client, &cli.enclave, cli.command),
    )
    .await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run_command(
    client: &EdiClient,
    enclave: &str,
    command: Commands,
) -> Result<(), client::CliError> {
    match command {
        Commands::Deploy { image, scale } => {
            commands::deploy::run(client, enclave, &image, scale).await
        }
        Commands::Undeploy {
            model_id,
            model_version,
        } => commands::undeploy::run(client, enclave, &model_id, model_version.as_deref()).await,
        Commands::Scale {
            model_id,
            scale,
            model_version,
        } => commands::scale::run(client, enclave, &model_id, scale, model_version.as_deref()).await,
        Commands::Inspect { model_id, format } => {
            commands::inspect::run(client, enclave, model_id.as_deref(), format).await
        }
    }
}
