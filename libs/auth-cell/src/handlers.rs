// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::account::Account;
use shared_models::auth::{AuthPayload, LoginRequest, TokenResponse};
use shared_models::error::AppError;

use crate::models::{
    DoctorSearchQuery, NurseSearchQuery, PatientSearchQuery, RegisterDoctorRequest,
    RegisterNurseRequest, RegisterPatientRequest,
};
use crate::router::AuthState;

// ==============================================================================
// AUTHENTICATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthPayload>, AppError> {
    let payload = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(payload))
}

pub async fn validate_token(
    State(state): State<Arc<AuthState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Json<TokenResponse> {
    debug!("Validating token");

    Json(TokenResponse {
        valid: state.auth.validate_token(auth.token()),
    })
}

pub async fn me(Extension(caller): Extension<Account>) -> Json<Account> {
    Json(caller)
}

// ==============================================================================
// REGISTRATION HANDLERS
// ==============================================================================

pub async fn register_doctor(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let account = state.registration.register_doctor(request).await?;
    Ok(created(account))
}

pub async fn register_nurse(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<RegisterNurseRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let account = state.registration.register_nurse(request).await?;
    Ok(created(account))
}

pub async fn register_patient(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let account = state.registration.register_patient(request).await?;
    Ok(created(account))
}

fn created(account: Account) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "account": account,
        })),
    )
}

// ==============================================================================
// DIRECTORY HANDLERS
// ==============================================================================

pub async fn list_doctors(
    State(state): State<Arc<AuthState>>,
    Extension(caller): Extension<Account>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors = state
        .directory
        .search_doctors(&caller, query.name.as_deref(), query.specialty.as_deref())
        .await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len(),
    })))
}

pub async fn list_nurses(
    State(state): State<Arc<AuthState>>,
    Extension(caller): Extension<Account>,
    Query(query): Query<NurseSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let nurses = state
        .directory
        .search_nurses(&caller, query.name.as_deref(), query.department.as_deref())
        .await?;

    Ok(Json(json!({
        "nurses": nurses,
        "total": nurses.len(),
    })))
}

pub async fn list_patients(
    State(state): State<Arc<AuthState>>,
    Extension(caller): Extension<Account>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = state
        .directory
        .search_patients(&caller, query.name.as_deref())
        .await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len(),
    })))
}
