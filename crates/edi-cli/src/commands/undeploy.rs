//! Implementation of the `edi undeploy` command.

use crate::client::{CliError, EdiClient};

pub async fn run(
    client: &EdiClient,
    enclave: &str,
    model_id: &str,
    model_version: Option<&str>,
) -> Result<(), CliError> {
    let removed = client.undeploy(enclave, model_id, model_version).await?;

    if removed.is_empty() {
        println!("No deployments matched {model_id}; nothing to undeploy");
        return Ok(());
    }

    for view in removed {
        println!("Undeployed {} (version: {})", view.model_id, view.model_version);
    }

    Ok(())
}
