//! HTTP client for the EDI control API.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use edi_control::api::{DeployModelRequest, ErrorResponse, ScaleModelRequest};
use edi_control::{DeploymentView, ErrorKind, InspectReport};

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// The control service reported an error.
    #[error("{message}")]
    Api {
        /// Machine-readable classification from the service.
        kind: ErrorKind,
        /// Human-readable message from the service.
        message: String,
    },

    /// Transport-level failure talking to the control service.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The overall `--timeout` deadline expired.
    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    /// The service answered with something unexpected.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Reported validation/business errors exit with 2; anything
    /// unexpected (transport, timeout, internal) exits with 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Api { kind, .. } if kind.is_reported() => 2,
            _ => 1,
        }
    }
}

/// Run an operation under the optional `--timeout` deadline.
pub async fn with_deadline<T>(
    secs: Option<u64>,
    operation: impl Future<Output = Result<T, CliError>>,
) -> Result<T, CliError> {
    match secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), operation).await {
            Ok(result) => result,
            Err(_) => Err(CliError::Timeout(secs)),
        },
        None => operation.await,
    }
}

/// Client for the control service HTTP API.
#[derive(Debug, Clone)]
pub struct EdiClient {
    client: Client,
    base_url: String,
}

impl EdiClient {
    /// Create a new client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CliError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CliError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Deploy an image into the enclave.
    pub async fn deploy(
        &self,
        enclave: &str,
        image: &str,
        scale: u32,
    ) -> Result<DeploymentView, CliError> {
        let url = format!("{}/enclaves/{}/models", self.base_url, enclave);
        let request = DeployModelRequest {
            image: image.to_owned(),
            scale,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        Self::decode(response).await
    }

    /// Remove a model's deployments from the enclave.
    pub async fn undeploy(
        &self,
        enclave: &str,
        model_id: &str,
        version: Option<&str>,
    ) -> Result<Vec<DeploymentView>, CliError> {
        let url = format!("{}/enclaves/{}/models/{}", self.base_url, enclave, model_id);

        let mut request = self.client.delete(&url);
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Change a model's desired replica count.
    pub async fn scale(
        &self,
        enclave: &str,
        model_id: &str,
        scale: u32,
        version: Option<&str>,
    ) -> Result<Vec<DeploymentView>, CliError> {
        let url = format!(
            "{}/enclaves/{}/models/{}/scale",
            self.base_url, enclave, model_id
        );
        let request = ScaleModelRequest {
            scale,
            version: version.map(ToOwned::to_owned),
        };

        let response = self.client.put(&url).json(&request).send().await?;
        Self::decode(response).await
    }

    /// Report the deployments in the enclave.
    pub async fn inspect(
        &self,
        enclave: &str,
        model_id: Option<&str>,
    ) -> Result<InspectReport, CliError> {
        let url = format!("{}/enclaves/{}/models", self.base_url, enclave);

        let mut request = self.client.get(&url);
        if let Some(model_id) = model_id {
            request = request.query(&[("model_id", model_id)]);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CliError> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(CliError::Http);
        }

        match response.json::<ErrorResponse>().await {
            Ok(body) => Err(CliError::Api {
                kind: body.kind,
                message: body.error,
            }),
            Err(_) => Err(CliError::Protocol(format!("status {status}"))),
        }
    }
}
