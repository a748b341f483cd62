//! EDI Control Plane
//!
//! This crate tracks model deployments inside isolated cluster partitions
//! (enclaves). Each deployment is identified by the (model id, model
//! version) pair extracted from its image labels, unique within its
//! enclave, and carries a desired replica count.
//!
//! # Architecture
//!
//! The control plane is responsible for:
//!
//! - **Lifecycle operations**: deploy, undeploy, scale and inspect, with
//!   validation performed before any state change
//! - **State management**: the [`registry`] is the single source of truth
//!   for deployment records and owns the uniqueness invariant
//! - **Collaborators**: an image [`resolver`] turns an image reference into
//!   model labels, and an enclave [`probe`] distinguishes an unreachable
//!   enclave from one that is merely empty
//! - **API surface**: HTTP endpoints over the operations, with a
//!   machine-readable error taxonomy
//!
//! # State machine
//!
//! Per (enclave, model id, model version):
//!
//! ```text
//! absent ──deploy──▶ deployed ──undeploy──▶ absent
//!                       │
//!                     scale (self-loop, replica count updated)
//! ```
//!
//! Deploying into an occupied slot is rejected as a duplicate; scaling an
//! absent slot is rejected as not found; undeploying an absent slot is a
//! permitted no-op rather than an error.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod types;
pub mod view;

// Re-export commonly used types at the crate root
pub use config::ControlConfig;
pub use error::{EdiError, EdiResult, ErrorKind};
pub use probe::{EnclaveProbe, HttpEnclaveProbe, StaticProbe};
pub use registry::{DeploymentRegistry, MemoryRegistry, PostgresRegistry};
pub use resolver::{HttpImageResolver, ImageResolver, StaticResolver};
pub use service::{DeploymentService, ServiceTimeouts};
pub use types::{
    DeploymentRecord, EnclaveName, ImageLabels, ModelId, ModelVersion, VersionSelector,
};
pub use view::{DeploymentView, InspectReport};
