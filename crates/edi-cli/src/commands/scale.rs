//! Implementation of the `edi scale` command.

use crate::client::{CliError, EdiClient};

pub async fn run(
    client: &EdiClient,
    enclave: &str,
    model_id: &str,
    scale: u32,
    model_version: Option<&str>,
) -> Result<(), CliError> {
    let updated = client.scale(enclave, model_id, scale, model_version).await?;

    for view in updated {
        println!(
            "Scaled {} (version: {}) to {}",
            view.model_id, view.model_version, view.desired_replicas
        );
    }

    Ok(())
}
