//! Core types for edi-control.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of an enclave (an isolated deployment scope).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnclaveName(String);

impl EnclaveName {
    /// Create a new enclave name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnclaveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EnclaveName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a model, extracted from its image labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Create a new model ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Version of a model, extracted from its image labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersion(String);

impl ModelVersion {
    /// Create a new model version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Get the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ModelVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Descriptive labels carried by a model image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLabels {
    /// Model identifier.
    pub model_id: ModelId,
    /// Model version.
    pub model_version: ModelVersion,
}

/// Selects which versions of a model an operation applies to.
///
/// Undeploy and scale accept either a specific version or every version of
/// a model id; the two behaviours are distinct enough to warrant an explicit
/// sum type rather than an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Every version of the model.
    AllVersions,
    /// One exact version.
    Specific(ModelVersion),
}

impl VersionSelector {
    /// Build a selector from an optional version string, as received at the
    /// API and CLI boundaries.
    #[must_use]
    pub fn from_option(version: Option<String>) -> Self {
        match version {
            Some(v) => Self::Specific(ModelVersion::new(v)),
            None => Self::AllVersions,
        }
    }

    /// Whether the selector matches the given version.
    #[must_use]
    pub fn matches(&self, version: &ModelVersion) -> bool {
        match self {
            Self::AllVersions => true,
            Self::Specific(v) => v == version,
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllVersions => write!(f, "any version"),
            Self::Specific(v) => write!(f, "{v}"),
        }
    }
}

/// One active deployment unit.
///
/// A record either fully exists with all fields populated or does not exist;
/// there is no partially-constructed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Enclave the deployment lives in.
    pub enclave: EnclaveName,
    /// Model identifier from the image labels.
    pub model_id: ModelId,
    /// Model version from the image labels.
    pub model_version: ModelVersion,
    /// The opaque image reference supplied at deploy time.
    pub image: String,
    /// Desired replica count, always at least 1.
    pub desired_replicas: u32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Create a new record from resolved image labels.
    #[must_use]
    pub fn new(
        enclave: EnclaveName,
        labels: ImageLabels,
        image: impl Into<String>,
        desired_replicas: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            enclave,
            model_id: labels.model_id,
            model_version: labels.model_version,
            image: image.into(),
            desired_replicas,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_from_labels() {
        let labels = ImageLabels {
            model_id: ModelId::new("demo"),
            model_version: ModelVersion::new("1.0"),
        };
        let record = DeploymentRecord::new(EnclaveName::new("production"), labels, "img1", 3);

        assert_eq!(record.enclave.as_str(), "production");
        assert_eq!(record.model_id.as_str(), "demo");
        assert_eq!(record.model_version.as_str(), "1.0");
        assert_eq!(record.image, "img1");
        assert_eq!(record.desired_replicas, 3);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn selector_from_option() {
        assert_eq!(VersionSelector::from_option(None), VersionSelector::AllVersions);
        assert_eq!(
            VersionSelector::from_option(Some("2.1".to_owned())),
            VersionSelector::Specific(ModelVersion::new("2.1"))
        );
    }

    #[test]
    fn selector_matching() {
        let version = ModelVersion::new("1.0");

        assert!(VersionSelector::AllVersions.matches(&version));
        assert!(VersionSelector::Specific(ModelVersion::new("1.0")).matches(&version));
        assert!(!VersionSelector::Specific(ModelVersion::new("2.0")).matches(&version));
    }

    #[test]
    fn identifiers_serialise_transparently() {
        let id = ModelId::new("demo");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"demo\"");

        let parsed: ModelVersion = serde_json::from_str("\"1.0\"").unwrap();
        assert_eq!(parsed, ModelVersion::new("1.0"));
    }
}
