use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use security_cell::PolicyError;
use shared_database::StoreError;
use shared_models::account::Account;
use shared_models::consultation::Consultation;
use shared_models::error::AppError;

// ==============================================================================
// FIELD LIMITS
// ==============================================================================

pub const MAX_REASON_LENGTH: usize = 500;
pub const MAX_DIAGNOSIS_LENGTH: usize = 2000;
pub const MAX_PRESCRIPTION_LENGTH: usize = 1000;
pub const MAX_NOTES_LENGTH: usize = 1000;

pub const RECENT_WINDOW_DAYS: i64 = 30;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConsultationRequest {
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub nurse_id: Option<Uuid>,
}

impl CreateConsultationRequest {
    pub fn validate(&self) -> Result<(), ConsultationError> {
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(ConsultationError::Validation("reason is required".to_string()));
        }
        check_length("reason", Some(reason), MAX_REASON_LENGTH)?;
        self.clinical_fields().validate()
    }

    pub fn clinical_fields(&self) -> ClinicalFields {
        ClinicalFields {
            diagnosis: self.diagnosis.clone(),
            prescription: self.prescription.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// The only fields an update may touch. Each one is overwritten, so an
/// absent value clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFields {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

impl ClinicalFields {
    pub fn validate(&self) -> Result<(), ConsultationError> {
        check_length("diagnosis", self.diagnosis.as_deref(), MAX_DIAGNOSIS_LENGTH)?;
        check_length("prescription", self.prescription.as_deref(), MAX_PRESCRIPTION_LENGTH)?;
        check_length("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)
    }

    pub fn apply_to(self, consultation: &mut Consultation) {
        consultation.diagnosis = self.diagnosis;
        consultation.prescription = self.prescription;
        consultation.notes = self.notes;
    }
}

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), ConsultationError> {
    match value {
        Some(value) if value.chars().count() > max => Err(ConsultationError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl From<&Account> for ParticipantSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            name: account.name().to_string(),
            email: account.email().to_string(),
            specialty: account.as_doctor().map(|doctor| doctor.specialty.clone()),
            department: account.as_nurse().and_then(|nurse| nurse.department.clone()),
        }
    }
}

/// A consultation with its participants resolved. A summary is absent when
/// the referenced account can no longer be found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationDetails {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient: Option<ParticipantSummary>,
    pub doctor: Option<ParticipantSummary>,
    pub nurse: Option<ParticipantSummary>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum ConsultationError {
    #[error("Consultation {0} not found")]
    NotFound(Uuid),

    #[error("{kind} {id} not found")]
    ReferenceNotFound { kind: &'static str, id: Uuid },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ConsultationError {
    fn from(err: StoreError) -> Self {
        ConsultationError::Storage(err.to_string())
    }
}

impl From<PolicyError> for ConsultationError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::AccessDenied(msg) => ConsultationError::AccessDenied(msg),
        }
    }
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::NotFound(_) | ConsultationError::ReferenceNotFound { .. } => {
                AppError::NotFound(err.to_string())
            }
            ConsultationError::AccessDenied(msg) => AppError::Forbidden(msg),
            ConsultationError::Validation(msg) => AppError::ValidationError(msg),
            ConsultationError::Storage(msg) => AppError::Database(msg),
        }
    }
}
