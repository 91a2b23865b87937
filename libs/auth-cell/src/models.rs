use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use security_cell::PolicyError;
use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub license_number: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterNurseRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub license_number: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub tax_id: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoctorSearchQuery {
    pub name: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NurseSearchQuery {
    pub name: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub name: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Email is already registered")]
    EmailAlreadyUsed,

    #[error("{field} {value} is already registered")]
    DuplicateNaturalKey { field: &'static str, value: String },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

impl From<PolicyError> for AuthError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::AccessDenied(msg) => AuthError::AccessDenied(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountNotFound
            | AuthError::Unauthenticated(_) => AppError::Auth(err.to_string()),
            AuthError::EmailAlreadyUsed | AuthError::DuplicateNaturalKey { .. } => {
                AppError::Conflict(err.to_string())
            }
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::AccessDenied(msg) => AppError::Forbidden(msg),
            AuthError::Storage(msg) => AppError::Database(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

// ==============================================================================
// FIELD VALIDATION
// ==============================================================================

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const LICENSE_NUMBER_LENGTH: (usize, usize) = (4, 20);
pub const TAX_ID_LENGTH: (usize, usize) = (11, 14);
pub const MAX_SPECIALTY_LENGTH: usize = 100;
pub const MAX_DEPARTMENT_LENGTH: usize = 100;
pub const MAX_PHONE_LENGTH: usize = 15;
pub const MAX_ADDRESS_LENGTH: usize = 200;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_identity(name: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if name.trim().is_empty() {
        return Err(AuthError::Validation("name is required".to_string()));
    }
    if !email_regex().is_match(email) {
        return Err(AuthError::Validation(format!("email {} is not valid", email)));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_length(
    field: &str,
    value: &str,
    (min, max): (usize, usize),
) -> Result<(), AuthError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AuthError::Validation(if min == 0 {
            format!("{} must be at most {} characters", field, max)
        } else {
            format!("{} must be between {} and {} characters", field, min, max)
        }));
    }
    Ok(())
}

pub fn validate_optional(field: &str, value: Option<&str>, max: usize) -> Result<(), AuthError> {
    match value {
        Some(value) => validate_length(field, value, (0, max)),
        None => Ok(()),
    }
}
