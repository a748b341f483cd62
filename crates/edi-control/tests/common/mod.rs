//! Common test utilities for control-plane integration tests.

use std::sync::Arc;

use edi_control::{
    DeploymentService, EnclaveName, EnclaveProbe, ImageResolver, MemoryRegistry, ServiceTimeouts,
    StaticProbe, StaticResolver,
};

/// Complete control plane wired against static collaborators.
pub struct TestControl {
    pub service: Arc<DeploymentService>,
    pub resolver: Arc<StaticResolver>,
    pub probe: Arc<StaticProbe>,
}

impl TestControl {
    /// Creates a control plane with an empty registry. No enclave is
    /// reachable until [`TestControl::enclave`] marks it.
    pub fn new() -> Self {
        let registry = Arc::new(MemoryRegistry::new());
        let resolver = Arc::new(StaticResolver::new());
        let probe = Arc::new(StaticProbe::new());

        let resolver_dyn: Arc<dyn ImageResolver> = resolver.clone();
        let probe_dyn: Arc<dyn EnclaveProbe> = probe.clone();
        let service = Arc::new(DeploymentService::new(
            registry,
            resolver_dyn,
            probe_dyn,
            ServiceTimeouts::default(),
        ));

        Self {
            service,
            resolver,
            probe,
        }
    }

    /// Marks an enclave as reachable and returns its name.
    pub fn enclave(&self, name: &str) -> EnclaveName {
        let enclave = EnclaveName::new(name);
        self.probe.mark_reachable(&enclave);
        enclave
    }

    /// Registers an image reference with the static resolver.
    pub fn seed_image(&self, image: &str, model_id: &str, model_version: &str) {
        self.resolver.insert(image, model_id, model_version);
    }
}
