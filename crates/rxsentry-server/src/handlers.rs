//! HTTP request handlers

use crate::dto::{
    CheckInteractionsRequest, CheckInteractionsResponse, DoseAdjustmentRequest, DoseAdjustmentResponse,
    DrugInfo, DrugListResponse, HealthResponse, HepaticAdjustmentRequest,
};
use crate::error::AppError;
use crate::ServicePipeline;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rxsentry_engine::{HepaticDoseRequest, RenalDoseRequest};
use std::sync::Arc;
use tracing::debug;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ServicePipeline>,
}

/// Check a drug list for interactions
pub async fn check_handler(
    State(state): State<AppState>,
    payload: Result<Json<CheckInteractionsRequest>, JsonRejection>,
) -> Result<Json<CheckInteractionsResponse>, AppError> {
    let Json(req) = payload?;
    debug!(drugs = req.drug_ids.len(), patient = ?req.patient_id, "Check request");

    let report = state.pipeline.check(req.into()).await?;
    Ok(Json(report.into()))
}

/// Renal dose adjustment
pub async fn dose_adjustment_handler(
    State(state): State<AppState>,
    payload: Result<Json<DoseAdjustmentRequest>, JsonRejection>,
) -> Result<Json<DoseAdjustmentResponse>, AppError> {
    let Json(req) = payload?;
    let request = RenalDoseRequest::try_from(req)?;
    let result = state.pipeline.dose_adjustment(&request)?;
    Ok(Json(result.into()))
}

/// Hepatic dose adjustment
pub async fn hepatic_adjustment_handler(
    State(state): State<AppState>,
    payload: Result<Json<HepaticAdjustmentRequest>, JsonRejection>,
) -> Result<Json<DoseAdjustmentResponse>, AppError> {
    let Json(req) = payload?;
    let request = HepaticDoseRequest::try_from(req)?;
    let result = state.pipeline.hepatic_adjustment(&request)?;
    Ok(Json(result.into()))
}

/// List catalog drugs
pub async fn drugs_handler(State(state): State<AppState>) -> Result<Json<DrugListResponse>, AppError> {
    let drugs: Vec<DrugInfo> = state.pipeline.list_drugs()?.into_iter().map(DrugInfo::from).collect();
    Ok(Json(DrugListResponse {
        count: drugs.len(),
        drugs,
    }))
}

/// Health check; 503 when the catalog is unreachable
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let report = state.pipeline.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report.into()))
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/check", post(check_handler))
        .route("/dose-adjustment", post(dose_adjustment_handler))
        .route("/dose-adjustment/hepatic", post(hepatic_adjustment_handler))
        .route("/drugs", get(drugs_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
