use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use shared_models::account::{Account, AccountCore, Doctor, Nurse, Patient};

use crate::models::{
    normalize_email, validate_identity, validate_length, validate_optional, AuthError,
    RegisterDoctorRequest, RegisterNurseRequest, RegisterPatientRequest, LICENSE_NUMBER_LENGTH,
    MAX_ADDRESS_LENGTH, MAX_DEPARTMENT_LENGTH, MAX_PHONE_LENGTH, MAX_SPECIALTY_LENGTH,
    TAX_ID_LENGTH,
};
use crate::services::auth::AuthService;

/// Builds role-specific accounts from public sign-up requests.
pub struct RegistrationService {
    auth: Arc<AuthService>,
}

impl RegistrationService {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    pub async fn register_doctor(&self, request: RegisterDoctorRequest) -> Result<Account, AuthError> {
        let email = normalize_email(&request.email);
        validate_identity(&request.name, &email, &request.password)?;
        validate_length("license number", &request.license_number, LICENSE_NUMBER_LENGTH)?;
        if request.specialty.trim().is_empty() {
            return Err(AuthError::Validation("specialty is required".to_string()));
        }
        validate_length("specialty", &request.specialty, (1, MAX_SPECIALTY_LENGTH))?;

        debug!("Registering doctor {}", email);
        let account = Account::Doctor(Doctor {
            account: new_core(&request.name, email),
            license_number: request.license_number.trim().to_string(),
            specialty: request.specialty.trim().to_string(),
        });

        self.auth.register(account, &request.password).await
    }

    pub async fn register_nurse(&self, request: RegisterNurseRequest) -> Result<Account, AuthError> {
        let email = normalize_email(&request.email);
        validate_identity(&request.name, &email, &request.password)?;
        validate_length("license number", &request.license_number, LICENSE_NUMBER_LENGTH)?;
        validate_optional("department", request.department.as_deref(), MAX_DEPARTMENT_LENGTH)?;

        debug!("Registering nurse {}", email);
        let account = Account::Nurse(Nurse {
            account: new_core(&request.name, email),
            license_number: request.license_number.trim().to_string(),
            department: trimmed(request.department),
        });

        self.auth.register(account, &request.password).await
    }

    pub async fn register_patient(&self, request: RegisterPatientRequest) -> Result<Account, AuthError> {
        let email = normalize_email(&request.email);
        validate_identity(&request.name, &email, &request.password)?;
        validate_length("tax id", &request.tax_id, TAX_ID_LENGTH)?;
        validate_optional("phone", request.phone.as_deref(), MAX_PHONE_LENGTH)?;
        validate_optional("address", request.address.as_deref(), MAX_ADDRESS_LENGTH)?;

        debug!("Registering patient {}", email);
        let account = Account::Patient(Patient {
            account: new_core(&request.name, email),
            tax_id: request.tax_id.trim().to_string(),
            birth_date: request.birth_date,
            phone: trimmed(request.phone),
            address: trimmed(request.address),
        });

        self.auth.register(account, &request.password).await
    }
}

// The hash is filled in by AuthService::register
fn new_core(name: &str, email: String) -> AccountCore {
    AccountCore::new(name.trim().to_string(), email, String::new(), Utc::now())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
