//! In-memory deployment registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{EdiError, EdiResult};
use crate::types::{DeploymentRecord, EnclaveName, ModelId, ModelVersion, VersionSelector};

use super::DeploymentRegistry;

type DeploymentKey = (ModelId, ModelVersion);
type Shard = Arc<RwLock<HashMap<DeploymentKey, DeploymentRecord>>>;

/// In-memory deployment registry.
///
/// Each enclave gets its own shard behind its own lock, so mutations within
/// one enclave serialise against each other while other enclaves proceed
/// unblocked. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    enclaves: RwLock<HashMap<EnclaveName, Shard>>,
}

impl MemoryRegistry {
    /// Create a new empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, enclave: &EnclaveName) -> EdiResult<Option<Shard>> {
        let enclaves = self
            .enclaves
            .read()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        Ok(enclaves.get(enclave).map(Arc::clone))
    }

    fn shard_or_create(&self, enclave: &EnclaveName) -> EdiResult<Shard> {
        let mut enclaves = self
            .enclaves
            .write()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        Ok(Arc::clone(enclaves.entry(enclave.clone()).or_default()))
    }
}

fn sort_records(mut records: Vec<DeploymentRecord>) -> Vec<DeploymentRecord> {
    records.sort_by(|a, b| {
        (&a.model_id, &a.model_version).cmp(&(&b.model_id, &b.model_version))
    });
    records
}

#[async_trait]
impl DeploymentRegistry for MemoryRegistry {
    async fn put(&self, record: DeploymentRecord) -> EdiResult<()> {
        let shard = self.shard_or_create(&record.enclave)?;
        let mut deployments = shard
            .write()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        let key = (record.model_id.clone(), record.model_version.clone());
        if deployments.contains_key(&key) {
            return Err(EdiError::duplicate(
                record.model_id,
                record.model_version,
            ));
        }

        deployments.insert(key, record);
        Ok(())
    }

    async fn remove(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
    ) -> EdiResult<Vec<DeploymentRecord>> {
        let Some(shard) = self.shard(enclave)? else {
            return Ok(Vec::new());
        };

        let mut deployments = shard
            .write()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        let keys: Vec<DeploymentKey> = deployments
            .keys()
            .filter(|(id, version)| id == model_id && selector.matches(version))
            .cloned()
            .collect();

        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = deployments.remove(&key) {
                removed.push(record);
            }
        }

        Ok(sort_records(removed))
    }

    async fn set_scale(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
        replicas: u32,
    ) -> EdiResult<Vec<DeploymentRecord>> {
        let Some(shard) = self.shard(enclave)? else {
            return Err(EdiError::model_not_found(model_id.clone(), selector.clone()));
        };

        let mut deployments = shard
            .write()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        let mut updated = Vec::new();
        for ((id, version), record) in deployments.iter_mut() {
            if id == model_id && selector.matches(version) {
                record.desired_replicas = replicas;
                record.updated_at = chrono::Utc::now();
                updated.push(record.clone());
            }
        }

        if updated.is_empty() {
            return Err(EdiError::model_not_found(model_id.clone(), selector.clone()));
        }

        Ok(sort_records(updated))
    }

    async fn list(&self, enclave: &EnclaveName) -> EdiResult<Vec<DeploymentRecord>> {
        let Some(shard) = self.shard(enclave)? else {
            return Ok(Vec::new());
        };

        let deployments = shard
            .read()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        Ok(sort_records(deployments.values().cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageLabels;

    fn record(enclave: &str, id: &str, version: &str, replicas: u32) -> DeploymentRecord {
        DeploymentRecord::new(
            EnclaveName::new(enclave),
            ImageLabels {
                model_id: ModelId::new(id),
                model_version: ModelVersion::new(version),
            },
            format!("registry/{id}:{version}"),
            replicas,
        )
    }

    #[tokio::test]
    async fn put_and_list() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");

        let records = registry.list(&enclave).await.expect("list failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model_id.as_str(), "demo");
        assert_eq!(records[0].desired_replicas, 1);
    }

    #[tokio::test]
    async fn duplicate_put_fails() {
        let registry = MemoryRegistry::new();

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("first put failed");

        let result = registry.put(record("production", "demo", "1.0", 2)).await;
        assert!(matches!(
            result,
            Err(EdiError::DuplicateDeployment { .. })
        ));

        // The original record is untouched
        let records = registry
            .list(&EnclaveName::new("production"))
            .await
            .expect("list failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].desired_replicas, 1);
    }

    #[tokio::test]
    async fn same_model_different_version_allowed() {
        let registry = MemoryRegistry::new();

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("production", "demo", "2.0", 1))
            .await
            .expect("put failed");

        let records = registry
            .list(&EnclaveName::new("production"))
            .await
            .expect("list failed");
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn same_model_other_enclave_allowed() {
        let registry = MemoryRegistry::new();

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("staging", "demo", "1.0", 1))
            .await
            .expect("put failed");

        let production = registry
            .list(&EnclaveName::new("production"))
            .await
            .expect("list failed");
        let staging = registry
            .list(&EnclaveName::new("staging"))
            .await
            .expect("list failed");
        assert_eq!(production.len(), 1);
        assert_eq!(staging.len(), 1);
    }

    #[tokio::test]
    async fn remove_specific_version() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("production", "demo", "2.0", 1))
            .await
            .expect("put failed");

        let removed = registry
            .remove(
                &enclave,
                &ModelId::new("demo"),
                &VersionSelector::Specific(ModelVersion::new("1.0")),
            )
            .await
            .expect("remove failed");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].model_version.as_str(), "1.0");

        let records = registry.list(&enclave).await.expect("list failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model_version.as_str(), "2.0");
    }

    #[tokio::test]
    async fn remove_all_versions() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("production", "demo", "2.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("production", "other", "1.0", 1))
            .await
            .expect("put failed");

        let removed = registry
            .remove(&enclave, &ModelId::new("demo"), &VersionSelector::AllVersions)
            .await
            .expect("remove failed");
        assert_eq!(removed.len(), 2);

        let records = registry.list(&enclave).await.expect("list failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model_id.as_str(), "other");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        let removed = registry
            .remove(&enclave, &ModelId::new("demo"), &VersionSelector::AllVersions)
            .await
            .expect("remove on empty registry failed");
        assert!(removed.is_empty());

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");

        let first = registry
            .remove(&enclave, &ModelId::new("demo"), &VersionSelector::AllVersions)
            .await
            .expect("first remove failed");
        assert_eq!(first.len(), 1);

        let second = registry
            .remove(&enclave, &ModelId::new("demo"), &VersionSelector::AllVersions)
            .await
            .expect("second remove failed");
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn set_scale_updates_matches() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("production", "demo", "2.0", 1))
            .await
            .expect("put failed");

        let updated = registry
            .set_scale(&enclave, &ModelId::new("demo"), &VersionSelector::AllVersions, 3)
            .await
            .expect("set_scale failed");
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|r| r.desired_replicas == 3));

        let records = registry.list(&enclave).await.expect("list failed");
        assert!(records.iter().all(|r| r.desired_replicas == 3));
    }

    #[tokio::test]
    async fn set_scale_specific_version() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");
        registry
            .put(record("production", "demo", "2.0", 1))
            .await
            .expect("put failed");

        let updated = registry
            .set_scale(
                &enclave,
                &ModelId::new("demo"),
                &VersionSelector::Specific(ModelVersion::new("2.0")),
                5,
            )
            .await
            .expect("set_scale failed");
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].desired_replicas, 5);

        let records = registry.list(&enclave).await.expect("list failed");
        let untouched = records
            .iter()
            .find(|r| r.model_version.as_str() == "1.0")
            .expect("version 1.0 missing");
        assert_eq!(untouched.desired_replicas, 1);
    }

    #[tokio::test]
    async fn set_scale_without_match_fails() {
        let registry = MemoryRegistry::new();
        let enclave = EnclaveName::new("production");

        let result = registry
            .set_scale(&enclave, &ModelId::new("demo"), &VersionSelector::AllVersions, 2)
            .await;
        assert!(matches!(result, Err(EdiError::ModelNotFound { .. })));

        registry
            .put(record("production", "demo", "1.0", 1))
            .await
            .expect("put failed");

        let result = registry
            .set_scale(
                &enclave,
                &ModelId::new("demo"),
                &VersionSelector::Specific(ModelVersion::new("9.9")),
                2,
            )
            .await;
        assert!(matches!(result, Err(EdiError::ModelNotFound { .. })));
    }

    #[tokio::test]
    async fn list_unknown_enclave_is_empty() {
        let registry = MemoryRegistry::new();

        let records = registry
            .list(&EnclaveName::new("nowhere"))
            .await
            .expect("list failed");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn concurrent_puts_single_winner() {
        let registry = Arc::new(MemoryRegistry::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.put(record("production", "demo", "1.0", 1)).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.expect("task panicked").is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);

        let records = registry
            .list(&EnclaveName::new("production"))
            .await
            .expect("list failed");
        assert_eq!(records.len(), 1);
    }
}
