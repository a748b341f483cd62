//! Enclave reachability probing.
//!
//! An enclave that exists but holds no deployments is very different from
//! one that cannot be reached; the probe is what tells the two apart.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::{ProbeConfig, ProbeType};
use crate::error::{EdiError, EdiResult};
use crate::types::EnclaveName;

/// Liveness probe for enclaves.
///
/// Pure lookup with no side effects on the registry.
#[async_trait]
pub trait EnclaveProbe: Send + Sync {
    /// Whether the enclave exists and is reachable.
    ///
    /// Transport failures surface as [`EdiError::Connection`].
    async fn reachable(&self, enclave: &EnclaveName) -> EdiResult<bool>;
}

/// Create a probe from configuration.
pub fn create_probe(config: &ProbeConfig) -> EdiResult<Arc<dyn EnclaveProbe>> {
    match config.probe_type {
        ProbeType::Http => Ok(Arc::new(HttpEnclaveProbe::new(config)?)),
        ProbeType::Static => Ok(Arc::new(StaticProbe::all_reachable())),
    }
}

/// Probe backed by an HTTP health endpoint per enclave.
#[derive(Debug, Clone)]
pub struct HttpEnclaveProbe {
    client: Client,
    base_url: String,
}

impl HttpEnclaveProbe {
    /// Create a new HTTP probe from configuration.
    pub fn new(config: &ProbeConfig) -> EdiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(EdiError::Http)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl EnclaveProbe for HttpEnclaveProbe {
    async fn reachable(&self, enclave: &EnclaveName) -> EdiResult<bool> {
        let url = format!("{}/enclaves/{}/health", self.base_url, enclave);

        debug!(enclave = %enclave, url = %url, "probing enclave");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| EdiError::connection(enclave.clone()))?;

        Ok(response.status().is_success())
    }
}

/// Probe with a fixed reachable set, for tests and local use.
#[derive(Debug, Default)]
pub struct StaticProbe {
    all: bool,
    enclaves: RwLock<HashSet<EnclaveName>>,
}

impl StaticProbe {
    /// Create a probe where no enclave is reachable until marked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a probe that treats every enclave as reachable.
    #[must_use]
    pub fn all_reachable() -> Self {
        Self {
            all: true,
            enclaves: RwLock::new(HashSet::new()),
        }
    }

    /// Mark an enclave as reachable.
    pub fn mark_reachable(&self, enclave: &EnclaveName) {
        if let Ok(mut enclaves) = self.enclaves.write() {
            enclaves.insert(enclave.clone());
        }
    }
}

#[async_trait]
impl EnclaveProbe for StaticProbe {
    async fn reachable(&self, enclave: &EnclaveName) -> EdiResult<bool> {
        if self.all {
            return Ok(true);
        }

        let enclaves = self
            .enclaves
            .read()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        Ok(enclaves.contains(enclave))
    }
}
