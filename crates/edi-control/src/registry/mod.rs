//! Deployment registry backends.
//!
//! The registry is the single source of truth for deployment records and
//! owns every mutation invariant: uniqueness of (model id, model version)
//! within an enclave, idempotent removal, and existence checks on scale.
//! An in-memory implementation serves tests and single-process use; the
//! PostgreSQL implementation persists records across restarts.

mod memory;
mod postgres;

pub use memory::MemoryRegistry;
pub use postgres::PostgresRegistry;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{RegistryBackend, RegistryConfig};
use crate::error::EdiResult;
use crate::types::{DeploymentRecord, EnclaveName, ModelId, VersionSelector};

/// Backend for storing deployment records.
///
/// Implementations must keep check-then-act sequences atomic per enclave:
/// two concurrent `put` calls for the same (model id, version) must never
/// both succeed.
#[async_trait]
pub trait DeploymentRegistry: Send + Sync {
    /// Insert a new deployment record.
    ///
    /// Fails with [`EdiError::DuplicateDeployment`](crate::EdiError) if a
    /// record with the same (model id, model version) already exists in the
    /// record's enclave.
    async fn put(&self, record: DeploymentRecord) -> EdiResult<()>;

    /// Remove records matching the model id and version selector.
    ///
    /// Returns the removed records. An empty match is a successful no-op,
    /// not an error; removal must be safely repeatable.
    async fn remove(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
    ) -> EdiResult<Vec<DeploymentRecord>>;

    /// Update the desired replica count on every matching record.
    ///
    /// Fails with [`EdiError::ModelNotFound`](crate::EdiError) when nothing
    /// matches. Returns the updated records.
    async fn set_scale(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
        replicas: u32,
    ) -> EdiResult<Vec<DeploymentRecord>>;

    /// List all records in the enclave.
    ///
    /// An enclave with no deployments yields an empty list, not an error.
    async fn list(&self, enclave: &EnclaveName) -> EdiResult<Vec<DeploymentRecord>>;
}

/// Create a registry from configuration.
pub async fn create_registry(config: &RegistryConfig) -> EdiResult<Arc<dyn DeploymentRegistry>> {
    match config.backend {
        RegistryBackend::Memory => Ok(Arc::new(MemoryRegistry::new())),
        RegistryBackend::Postgres => {
            let registry = PostgresRegistry::new(&config.url, config.max_connections).await?;
            Ok(Arc::new(registry))
        }
    }
}
