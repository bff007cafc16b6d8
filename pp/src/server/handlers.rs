//! Route handlers
//!
//! Thin: validate the request shape, call one core operation, serialize.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::grid::GridDimensions;
use crate::progress::{ColorValidation, ExportedImage, ProgressError, ProgressStatus, ReportOutcome, validate_unique_colors};
use crate::relay::{Accepted, FillRequest, RelayCoordinator, RoundStatus, RoundSummary};
use crate::strategy::{ProgressReport, ReportedPixel};

use super::AppState;
use super::error::ApiError;

/// Body of `POST /api/configure/`
#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    pub m: Option<u64>,
    pub n: Option<u64>,
}

/// Response of `POST /api/configure/`
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub status: String,
    pub run_id: Uuid,
    pub m: u32,
    pub n: u32,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub m: Option<u64>,
    pub n: Option<u64>,
}

pub async fn configure(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureRequest>, JsonRejection>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    let Json(request) = payload?;
    debug!(?request, "configure: called");
    let (Some(m), Some(n)) = (request.m, request.n) else {
        return Err(ApiError::BadRequest("m and n are required".to_string()));
    };

    let run = state.store.configure(m, n).await?;
    Ok(Json(ConfigureResponse {
        status: "configured".to_string(),
        run_id: run.run_id,
        m: run.m,
        n: run.n,
    }))
}

pub async fn generate(State(state): State<AppState>) -> Result<Json<RoundSummary>, ApiError> {
    debug!("generate: called");
    state.store.status().await?;
    let summary = state.ping.kick_off().await?;
    Ok(Json(summary))
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ProgressStatus>, ApiError> {
    debug!(?query, "status: called");
    let status = state.store.status().await?;

    if let (Some(m), Some(n)) = (query.m, query.n) {
        let dims = GridDimensions::new(m, n).map_err(ProgressError::from)?;
        if !status.matches(&dims) {
            return Err(ProgressError::DimensionMismatch {
                expected_m: status.m,
                expected_n: status.n,
                actual_m: dims.m(),
                actual_n: dims.n(),
            }
            .into());
        }
    }
    Ok(Json(status))
}

pub async fn image(State(state): State<AppState>) -> Result<Json<ExportedImage>, ApiError> {
    debug!("image: called");
    Ok(Json(state.store.export_image().await?))
}

pub async fn validate(State(state): State<AppState>) -> Result<Json<ColorValidation>, ApiError> {
    debug!("validate: called");
    let exported = state.store.export_image().await?;
    Ok(Json(validate_unique_colors(&exported.image)))
}

pub async fn update_pixel(
    State(state): State<AppState>,
    payload: Result<Json<ProgressReport>, JsonRejection>,
) -> Result<Json<ReportOutcome>, ApiError> {
    let Json(report) = payload?;
    debug!(?report, "update_pixel: called");
    let outcome = match report {
        ProgressReport::Pixel {
            pixel: ReportedPixel { x, y, color },
        } => state.store.report_pixel(x, y, color).await?,
        ProgressReport::Range { start_index, end_index } => state.store.report_range(start_index, end_index).await?,
    };
    Ok(Json(outcome))
}

pub async fn ping(
    State(state): State<AppState>,
    payload: Result<Json<FillRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    accept(state.ping.clone(), request)
}

pub async fn pong(
    State(state): State<AppState>,
    payload: Result<Json<FillRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    accept(state.pong.clone(), request)
}

/// Acknowledge a fill request and run its round in the background
fn accept(coordinator: Arc<RelayCoordinator>, request: FillRequest) -> Result<impl IntoResponse, ApiError> {
    let peer = coordinator.peer();
    debug!(%peer, m = request.m, n = request.n, "accept: called");
    GridDimensions::new(request.m, request.n).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tokio::spawn(async move {
        match coordinator.run_round(request).await {
            Ok(summary) if summary.status == RoundStatus::Done => {
                info!(%peer, "Fill run finished");
            }
            Ok(summary) => {
                debug!(%peer, ?summary, "round complete");
            }
            Err(e) if e.is_rejection() => {
                warn!(%peer, error = %e, "Request rejected");
            }
            Err(e) if e.is_loop_breaking() => {
                error!(%peer, error = %e, "Round failed, chain stopped");
            }
            Err(e) => {
                warn!(%peer, error = %e, "Round failed");
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(Accepted::new(peer))))
}
