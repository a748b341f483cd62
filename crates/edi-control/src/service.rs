//! Deployment lifecycle operations.
//!
//! [`DeploymentService`] implements the four operations (deploy, undeploy,
//! scale, inspect) on top of the registry and the two external
//! collaborators. It is the only component that mutates the registry, and
//! every validation error is raised before any mutation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{EdiError, EdiResult};
use crate::probe::EnclaveProbe;
use crate::registry::DeploymentRegistry;
use crate::resolver::ImageResolver;
use crate::types::{
    DeploymentRecord, EnclaveName, ImageLabels, ModelId, VersionSelector,
};
use crate::view::InspectReport;

/// Upper bounds on collaborator calls.
///
/// Resolver and probe requests never hang the caller; on expiry they are
/// reported as the corresponding resolution/connection error.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTimeouts {
    /// Bound on a single image resolution.
    pub resolve: Duration,
    /// Bound on a single reachability probe.
    pub probe: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            resolve: Duration::from_secs(10),
            probe: Duration::from_secs(5),
        }
    }
}

/// Run an operation under an overall deadline.
///
/// Exceeding the deadline is reported as [`EdiError::Timeout`], distinct
/// from any validation failure the operation itself could produce.
pub async fn with_deadline<T>(
    deadline: Duration,
    operation: impl Future<Output = EdiResult<T>>,
) -> EdiResult<T> {
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(EdiError::Timeout(deadline)),
    }
}

/// Implements the deployment lifecycle against a registry.
pub struct DeploymentService {
    registry: Arc<dyn DeploymentRegistry>,
    resolver: Arc<dyn ImageResolver>,
    probe: Arc<dyn EnclaveProbe>,
    timeouts: ServiceTimeouts,
}

impl DeploymentService {
    /// Create a new deployment service.
    pub fn new(
        registry: Arc<dyn DeploymentRegistry>,
        resolver: Arc<dyn ImageResolver>,
        probe: Arc<dyn EnclaveProbe>,
        timeouts: ServiceTimeouts,
    ) -> Self {
        Self {
            registry,
            resolver,
            probe,
            timeouts,
        }
    }

    /// Deploy an image into an enclave.
    ///
    /// Checks run in a fixed order: replica validation, image resolution,
    /// enclave reachability, then the uniqueness-checked insert. A failure
    /// at any step leaves the registry untouched.
    pub async fn deploy(
        &self,
        enclave: &EnclaveName,
        image: &str,
        replicas: u32,
    ) -> EdiResult<DeploymentRecord> {
        validate_scale(replicas)?;

        let labels = self.resolve_image(image).await?;
        self.ensure_reachable(enclave).await?;

        let record = DeploymentRecord::new(enclave.clone(), labels, image, replicas);
        self.registry.put(record.clone()).await?;

        info!(
            enclave = %enclave,
            model_id = %record.model_id,
            model_version = %record.model_version,
            replicas = replicas,
            "model deployed"
        );

        Ok(record)
    }

    /// Remove matching deployments from an enclave.
    ///
    /// Safe to repeat: removing a model that is not deployed succeeds with
    /// an empty result.
    pub async fn undeploy(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
    ) -> EdiResult<Vec<DeploymentRecord>> {
        self.ensure_reachable(enclave).await?;

        let removed = self.registry.remove(enclave, model_id, selector).await?;

        info!(
            enclave = %enclave,
            model_id = %model_id,
            selector = %selector,
            removed = removed.len(),
            "model undeployed"
        );

        Ok(removed)
    }

    /// Change the desired replica count on matching deployments.
    pub async fn scale(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
        replicas: u32,
    ) -> EdiResult<Vec<DeploymentRecord>> {
        validate_scale(replicas)?;
        self.ensure_reachable(enclave).await?;

        let updated = self
            .registry
            .set_scale(enclave, model_id, selector, replicas)
            .await?;

        info!(
            enclave = %enclave,
            model_id = %model_id,
            selector = %selector,
            replicas = replicas,
            updated = updated.len(),
            "model scaled"
        );

        Ok(updated)
    }

    /// Report the deployments in an enclave, optionally filtered by model id.
    ///
    /// An enclave with zero deployments yields an empty report; only an
    /// unreachable enclave is an error.
    pub async fn inspect(
        &self,
        enclave: &EnclaveName,
        model_id: Option<&ModelId>,
    ) -> EdiResult<InspectReport> {
        self.ensure_reachable(enclave).await?;

        let mut records = self.registry.list(enclave).await?;
        if let Some(model_id) = model_id {
            records.retain(|r| &r.model_id == model_id);
        }

        debug!(enclave = %enclave, deployments = records.len(), "inspect");

        Ok(InspectReport::from_records(records))
    }

    async fn resolve_image(&self, image: &str) -> EdiResult<ImageLabels> {
        match tokio::time::timeout(self.timeouts.resolve, self.resolver.resolve(image)).await {
            Ok(result) => result,
            Err(_) => Err(EdiError::image_resolution(image)),
        }
    }

    async fn ensure_reachable(&self, enclave: &EnclaveName) -> EdiResult<()> {
        let reachable =
            match tokio::time::timeout(self.timeouts.probe, self.probe.reachable(enclave)).await {
                Ok(Ok(reachable)) => reachable,
                Ok(Err(_)) | Err(_) => false,
            };

        if reachable {
            Ok(())
        } else {
            Err(EdiError::connection(enclave.clone()))
        }
    }
}

impl std::fmt::Debug for DeploymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentService").finish_non_exhaustive()
    }
}

fn validate_scale(replicas: u32) -> EdiResult<()> {
    if replicas == 0 {
        return Err(EdiError::InvalidScale {
            requested: replicas,
        });
    }
    Ok(())
}
