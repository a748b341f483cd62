//! Configuration for edi-control.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{EdiError, EdiResult};
use crate::service::ServiceTimeouts;

/// Top-level configuration for the control service.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ControlConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Registry backend configuration.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Image resolver configuration.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Enclave probe configuration.
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl ControlConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `edi-control.toml` in the current directory (if present)
    /// 3. Environment variables with `EDI_CONTROL_` prefix
    pub fn load() -> EdiResult<Self> {
        Figment::new()
            .merge(Toml::file("edi-control.toml"))
            .merge(Env::prefixed("EDI_CONTROL_").split("__"))
            .extract()
            .map_err(|e| EdiError::Config(e.to_string()))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> EdiResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("EDI_CONTROL_").split("__"))
            .extract()
            .map_err(|e| EdiError::Config(e.to_string()))
    }

    /// Collaborator timeout bounds for the deployment service.
    #[must_use]
    pub const fn service_timeouts(&self) -> ServiceTimeouts {
        ServiceTimeouts {
            resolve: Duration::from_secs(self.resolver.timeout_secs),
            probe: Duration::from_secs(self.probe.timeout_secs),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Per-request deadline in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8085)
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Registry backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: RegistryBackend,

    /// PostgreSQL connection URL (postgres backend only).
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_registry_url() -> String {
    "postgres://localhost/edi".to_owned()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            url: default_registry_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Type of registry backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryBackend {
    /// In-memory registry, lost on restart.
    #[default]
    Memory,

    /// PostgreSQL-backed registry.
    Postgres,
}

/// Image resolver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Which resolver to use.
    #[serde(default)]
    pub resolver_type: ResolverType,

    /// Base URL of the label catalogue (http resolver only).
    #[serde(default = "default_resolver_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_resolver_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_resolver_url() -> String {
    "http://localhost:8086".to_owned()
}

const fn default_resolver_timeout_secs() -> u64 {
    10
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolver_type: ResolverType::default(),
            url: default_resolver_url(),
            timeout_secs: default_resolver_timeout_secs(),
        }
    }
}

/// Type of image resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverType {
    /// HTTP label catalogue.
    #[default]
    Http,

    /// Fixed in-memory table, for testing.
    Static,
}

/// Enclave probe configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Which probe to use.
    #[serde(default)]
    pub probe_type: ProbeType,

    /// Base URL of the enclave health endpoints (http probe only).
    #[serde(default = "default_probe_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_probe_url() -> String {
    "http://localhost:8087".to_owned()
}

const fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_type: ProbeType::default(),
            url: default_probe_url(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Type of enclave probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeType {
    /// Per-enclave HTTP health checks.
    #[default]
    Http,

    /// Treat every enclave as reachable, for testing.
    Static,
}
