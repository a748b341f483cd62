//! Implementation of the `edi deploy` command.

use crate::client::{CliError, EdiClient};

pub async fn run(
    client: &EdiClient,
    enclave: &str,
    image: &str,
    scale: u32,
) -> Result<(), CliError> {
    let view = client.deploy(enclave, image, scale).await?;

    println!(
        "Deployed {} (version: {}) with scale {} in enclave {}",
        view.model_id, view.model_version, view.desired_replicas, view.enclave
    );

    Ok(())
}
