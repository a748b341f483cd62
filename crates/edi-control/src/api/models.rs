//! Enclave-scoped model deployment endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EdiError, ErrorKind};
use crate::service;
use crate::types::{EnclaveName, ModelId, VersionSelector};
use crate::view::{DeploymentView, InspectReport};

use super::AppState;

/// Request to deploy a model image.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeployModelRequest {
    /// Image reference to deploy.
    pub image: String,
    /// Desired replica count.
    #[serde(default = "default_scale")]
    pub scale: u32,
}

const fn default_scale() -> u32 {
    1
}

/// Request to change a model's replica count.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScaleModelRequest {
    /// New desired replica count.
    pub scale: u32,
    /// Restrict the change to one version; all versions when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Query parameters for inspect.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InspectQuery {
    /// Restrict the report to one model id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

/// Query parameters for undeploy.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VersionQuery {
    /// Restrict removal to one version; all versions when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable classification.
    pub kind: ErrorKind,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Deploy a model image into an enclave.
pub async fn deploy_model(
    State(state): State<AppState>,
    Path(enclave): Path<String>,
    Json(request): Json<DeployModelRequest>,
) -> Result<(StatusCode, Json<DeploymentView>), ApiError> {
    let enclave = EnclaveName::new(enclave);

    info!(enclave = %enclave, image = %request.image, scale = request.scale, "deploy via API");

    let record = service::with_deadline(
        state.request_timeout,
        state.service.deploy(&enclave, &request.image, request.scale),
    )
    .await
    .map_err(error_reply)?;

    Ok((StatusCode::CREATED, Json(DeploymentView::from(record))))
}

/// Report the deployments in an enclave.
pub async fn inspect_models(
    State(state): State<AppState>,
    Path(enclave): Path<String>,
    Query(query): Query<InspectQuery>,
) -> Result<Json<InspectReport>, ApiError> {
    let enclave = EnclaveName::new(enclave);
    let model_id = query.model_id.map(ModelId::new);

    let report = service::with_deadline(
        state.request_timeout,
        state.service.inspect(&enclave, model_id.as_ref()),
    )
    .await
    .map_err(error_reply)?;

    Ok(Json(report))
}

/// Change the desired replica count of a deployed model.
pub async fn scale_model(
    State(state): State<AppState>,
    Path((enclave, model_id)): Path<(String, String)>,
    Json(request): Json<ScaleModelRequest>,
) -> Result<Json<Vec<DeploymentView>>, ApiError> {
    let enclave = EnclaveName::new(enclave);
    let model_id = ModelId::new(model_id);
    let selector = VersionSelector::from_option(request.version);

    info!(enclave = %enclave, model_id = %model_id, scale = request.scale, "scale via API");

    let updated = service::with_deadline(
        state.request_timeout,
        state
            .service
            .scale(&enclave, &model_id, &selector, request.scale),
    )
    .await
    .map_err(error_reply)?;

    Ok(Json(updated.into_iter().map(DeploymentView::from).collect()))
}

/// Remove a model's deployments from an enclave.
pub async fn undeploy_model(
    State(state): State<AppState>,
    Path((enclave, model_id)): Path<(String, String)>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<Vec<DeploymentView>>, ApiError> {
    let enclave = EnclaveName::new(enclave);
    let model_id = ModelId::new(model_id);
    let selector = VersionSelector::from_option(query.version);

    info!(enclave = %enclave, model_id = %model_id, "undeploy via API");

    let removed = service::with_deadline(
        state.request_timeout,
        state.service.undeploy(&enclave, &model_id, &selector),
    )
    .await
    .map_err(error_reply)?;

    Ok(Json(removed.into_iter().map(DeploymentView::from).collect()))
}

fn error_reply(error: EdiError) -> ApiError {
    (
        error_to_status(&error),
        Json(ErrorResponse {
            error: error.to_string(),
            kind: error.kind(),
        }),
    )
}

const fn error_to_status(error: &EdiError) -> StatusCode {
    match error {
        EdiError::InvalidScale { .. } | EdiError::ImageResolution { .. } => {
            StatusCode::BAD_REQUEST
        }
        EdiError::DuplicateDeployment { .. } => StatusCode::CONFLICT,
        EdiError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
        EdiError::Connection { .. } => StatusCode::BAD_GATEWAY,
        EdiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
