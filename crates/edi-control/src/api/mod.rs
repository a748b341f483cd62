//! HTTP API for the control service.
//!
//! Provides enclave-scoped endpoints for the four lifecycle operations
//! plus a health check. Error responses carry a machine-readable `kind`
//! next to the human-readable message so clients can branch on the error
//! taxonomy without scraping strings.

mod models;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::service::DeploymentService;

pub use models::{
    DeployModelRequest, ErrorResponse, InspectQuery, ScaleModelRequest, VersionQuery,
};

/// Shared application state for the control service.
#[derive(Clone)]
pub struct AppState {
    /// Deployment service implementing the lifecycle operations.
    pub service: Arc<DeploymentService>,
    /// Overall deadline applied to each request.
    pub request_timeout: Duration,
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/enclaves/{enclave}/models", post(models::deploy_model))
        .route("/enclaves/{enclave}/models", get(models::inspect_models))
        .route(
            "/enclaves/{enclave}/models/{model_id}",
            delete(models::undeploy_model),
        )
        .route(
            "/enclaves/{enclave}/models/{model_id}/scale",
            put(models::scale_model),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse { status: "healthy" })
}

/// Health response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}
