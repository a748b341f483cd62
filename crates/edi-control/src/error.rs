//! Error types for edi-control.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{EnclaveName, ModelId, ModelVersion, VersionSelector};

/// Result type alias using [`EdiError`].
pub type EdiResult<T> = Result<T, EdiError>;

/// Errors that can occur in the control plane.
///
/// Every validation error is raised before any registry mutation; a failed
/// operation never leaves a partially-applied record behind.
#[derive(Debug, thiserror::Error)]
pub enum EdiError {
    /// Requested replica count is below 1.
    #[error("scale of {requested} is invalid: should be greater than 0")]
    InvalidScale {
        /// The rejected replica count.
        requested: u32,
    },

    /// Image reference could not be resolved to model labels.
    #[error("Can't get image labels for {image}")]
    ImageResolution {
        /// The image reference that failed to resolve.
        image: String,
    },

    /// A record with the same model id and version already exists in the enclave.
    #[error("Duplicating model id and version (id={model_id}, version={version})")]
    DuplicateDeployment {
        /// Model identifier of the existing record.
        model_id: ModelId,
        /// Model version of the existing record.
        version: ModelVersion,
    },

    /// Scale targeted a model with no matching record.
    #[error("No one model can be found")]
    ModelNotFound {
        /// The model id that was targeted.
        model_id: ModelId,
        /// The version selector that was applied.
        selector: VersionSelector,
    },

    /// Enclave is unreachable.
    #[error("Failed to connect to enclave {enclave}")]
    Connection {
        /// The unreachable enclave.
        enclave: EnclaveName,
    },

    /// Overall operation deadline exceeded.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EdiError {
    /// Create an image resolution error.
    #[must_use]
    pub fn image_resolution(image: impl Into<String>) -> Self {
        Self::ImageResolution {
            image: image.into(),
        }
    }

    /// Create a duplicate deployment error.
    #[must_use]
    pub const fn duplicate(model_id: ModelId, version: ModelVersion) -> Self {
        Self::DuplicateDeployment { model_id, version }
    }

    /// Create a model-not-found error.
    #[must_use]
    pub const fn model_not_found(model_id: ModelId, selector: VersionSelector) -> Self {
        Self::ModelNotFound { model_id, selector }
    }

    /// Create a connection error.
    #[must_use]
    pub const fn connection(enclave: EnclaveName) -> Self {
        Self::Connection { enclave }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Machine-readable kind of this error, as reported on the wire.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidScale { .. } => ErrorKind::InvalidScale,
            Self::ImageResolution { .. } => ErrorKind::ImageResolution,
            Self::DuplicateDeployment { .. } => ErrorKind::DuplicateDeployment,
            Self::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Database(_)
            | Self::Http(_)
            | Self::Config(_)
            | Self::Serialisation(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Wire-level error classification.
///
/// Sent alongside the human-readable message so callers can branch on the
/// error without scraping strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Replica count below 1.
    InvalidScale,
    /// Image reference cannot be resolved.
    ImageResolution,
    /// Model id and version already deployed in the enclave.
    DuplicateDeployment,
    /// No record matched the scale target.
    ModelNotFound,
    /// Enclave unreachable.
    Connection,
    /// Deadline exceeded.
    Timeout,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Get the kind as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidScale => "invalid_scale",
            Self::ImageResolution => "image_resolution",
            Self::DuplicateDeployment => "duplicate_deployment",
            Self::ModelNotFound => "model_not_found",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }

    /// Whether this kind is a reported validation/business error, as opposed
    /// to an unexpected failure.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(
            self,
            Self::InvalidScale
                | Self::ImageResolution
                | Self::DuplicateDeployment
                | Self::ModelNotFound
                | Self::Connection
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
