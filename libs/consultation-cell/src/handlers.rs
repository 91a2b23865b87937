// libs/consultation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::account::Account;
use shared_models::consultation::Consultation;
use shared_models::error::AppError;

use crate::models::{ClinicalFields, ConsultationDetails, CreateConsultationRequest, PeriodQuery};
use crate::router::ConsultationState;

async fn list_response(
    state: &ConsultationState,
    consultations: Vec<Consultation>,
) -> Result<Json<Value>, AppError> {
    let details = state.details.expand_all(consultations).await?;

    Ok(Json(json!({
        "consultations": details,
        "total": details.len(),
    })))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_consultation(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Json(request): Json<CreateConsultationRequest>,
) -> Result<(StatusCode, Json<ConsultationDetails>), AppError> {
    let consultation = state.lifecycle.create(&caller, request).await?;
    let details = state.details.expand(consultation).await?;

    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn get_consultation(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(consultation_id): Path<Uuid>,
) -> Result<Json<ConsultationDetails>, AppError> {
    let consultation = state.lifecycle.get_by_id(&caller, consultation_id).await?;
    Ok(Json(state.details.expand(consultation).await?))
}

#[axum::debug_handler]
pub async fn update_consultation(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(consultation_id): Path<Uuid>,
    Json(fields): Json<ClinicalFields>,
) -> Result<Json<ConsultationDetails>, AppError> {
    let consultation = state.lifecycle.update(&caller, consultation_id, fields).await?;
    Ok(Json(state.details.expand(consultation).await?))
}

pub async fn delete_consultation(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(consultation_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.lifecycle.delete(&caller, consultation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// QUERY HANDLERS
// ==============================================================================

pub async fn list_all_consultations(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.all(&caller).await?;
    list_response(&state, consultations).await
}

pub async fn my_consultations(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.my_consultations(&caller).await?;
    list_response(&state, consultations).await
}

pub async fn patient_consultations(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.by_patient(&caller, patient_id).await?;
    list_response(&state, consultations).await
}

pub async fn future_patient_consultations(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let consultations = state
        .query
        .future_by_patient(&caller, patient_id, Utc::now())
        .await?;
    list_response(&state, consultations).await
}

pub async fn patient_history(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.full_history(&caller, patient_id).await?;
    list_response(&state, consultations).await
}

pub async fn doctor_consultations(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.by_doctor(&caller, doctor_id).await?;
    list_response(&state, consultations).await
}

pub async fn consultations_by_period(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<Value>, AppError> {
    debug!("Listing consultations between {} and {}", period.start, period.end);

    let consultations = state
        .query
        .by_period(&caller, period.start, period.end)
        .await?;
    list_response(&state, consultations).await
}

pub async fn recent_consultations(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.recent(&caller, Utc::now()).await?;
    list_response(&state, consultations).await
}

pub async fn consultations_by_specialty(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
    Path(specialty): Path<String>,
) -> Result<Json<Value>, AppError> {
    let consultations = state.query.by_specialty(&caller, &specialty).await?;
    list_response(&state, consultations).await
}

pub async fn consultation_stats(
    State(state): State<Arc<ConsultationState>>,
    Extension(caller): Extension<Account>,
) -> Result<Json<Value>, AppError> {
    let stats = state.query.statistics(&caller, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats,
    })))
}
