//! Image reference resolution.
//!
//! The control plane never builds or inspects images itself; it asks a
//! resolver for the descriptive labels (model id, model version) attached
//! to an image reference. The HTTP implementation queries an external label
//! catalogue; the static implementation backs tests and local use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::{ResolverConfig, ResolverType};
use crate::error::{EdiError, EdiResult};
use crate::types::{ImageLabels, ModelId, ModelVersion};

/// Resolves an image reference to its model labels.
///
/// Pure lookup with no side effects on the registry.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolve the image reference.
    ///
    /// Any failure (unknown image, transport error, timeout) surfaces as
    /// [`EdiError::ImageResolution`].
    async fn resolve(&self, image: &str) -> EdiResult<ImageLabels>;
}

/// Create a resolver from configuration.
pub fn create_resolver(config: &ResolverConfig) -> EdiResult<Arc<dyn ImageResolver>> {
    match config.resolver_type {
        ResolverType::Http => Ok(Arc::new(HttpImageResolver::new(config)?)),
        ResolverType::Static => Ok(Arc::new(StaticResolver::new())),
    }
}

/// Resolver backed by an HTTP label catalogue.
#[derive(Debug, Clone)]
pub struct HttpImageResolver {
    client: Client,
    base_url: String,
}

impl HttpImageResolver {
    /// Create a new HTTP resolver from configuration.
    pub fn new(config: &ResolverConfig) -> EdiResult<Self> {
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
impl ImageResolver for HttpImageResolver {
    async fn resolve(&self, image: &str) -> EdiResult<ImageLabels> {
        let url = format!("{}/labels", self.base_url);

        debug!(image = %image, url = %url, "resolving image labels");

        let response = self
            .client
            .get(&url)
            .query(&[("image", image)])
            .send()
            .await
            .map_err(|_| EdiError::image_resolution(image))?;

        if !response.status().is_success() {
            return Err(EdiError::image_resolution(image));
        }

        response
            .json::<ImageLabels>()
            .await
            .map_err(|_| EdiError::image_resolution(image))
    }
}

/// Resolver with a fixed image table, for tests and local use.
#[derive(Debug, Default)]
pub struct StaticResolver {
    images: RwLock<HashMap<String, ImageLabels>>,
}

impl StaticResolver {
    /// Create a new empty static resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image reference with its labels.
    pub fn insert(&self, image: impl Into<String>, model_id: &str, model_version: &str) {
        let labels = ImageLabels {
            model_id: ModelId::new(model_id),
            model_version: ModelVersion::new(model_version),
        };

        if let Ok(mut images) = self.images.write() {
            images.insert(image.into(), labels);
        }
    }
}

#[async_trait]
impl ImageResolver for StaticResolver {
    async fn resolve(&self, image: &str) -> EdiResult<ImageLabels> {
        let images = self
            .images
            .read()
            .map_err(|_| EdiError::internal("lock poisoned"))?;

        images
            .get(image)
            .cloned()
            .ok_or_else(|| EdiError::image_resolution(image))
    }
}
