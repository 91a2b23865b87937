// =====================================================================================
// AUTHORIZATION POLICY - ROLE & OWNERSHIP RULES
// =====================================================================================

use tracing::{debug, warn};

use shared_models::account::{Account, Role};

use crate::models::{Operation, PolicyError};

const ANY_ROLE: &[Role] = &[Role::Doctor, Role::Nurse, Role::Patient];
const STAFF: &[Role] = &[Role::Doctor, Role::Nurse];
const DOCTOR_ONLY: &[Role] = &[Role::Doctor];

pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Roles allowed to attempt `operation` at all.
    pub fn allowed_roles(operation: &Operation) -> &'static [Role] {
        match operation {
            Operation::CreateConsultation => STAFF,
            Operation::UpdateConsultation | Operation::DeleteConsultation => DOCTOR_ONLY,
            Operation::ReadConsultation { .. }
            | Operation::ListConsultationsByPatient { .. }
            | Operation::ListFutureConsultationsByPatient { .. } => ANY_ROLE,
            Operation::ListPatientHistory
            | Operation::ListConsultationsByDoctor
            | Operation::ListAllConsultations
            | Operation::ListConsultationsByPeriod
            | Operation::ListRecentConsultations
            | Operation::ListConsultationsBySpecialty
            | Operation::ConsultationStatistics
            | Operation::BrowseDirectory => STAFF,
        }
    }

    /// Single entry point for every guarded operation. Callers must confirm the
    /// target exists before asking, so a denial never hides a missing record.
    pub fn authorize(caller: &Account, operation: &Operation) -> Result<(), PolicyError> {
        let role = caller.role();

        if !Self::allowed_roles(operation).contains(&role) {
            warn!(
                "Denied {} for {} account {}",
                operation,
                role,
                caller.id()
            );
            return Err(PolicyError::AccessDenied(format!(
                "role {} may not {}",
                role, operation
            )));
        }

        if role == Role::Patient {
            if let Some(patient_id) = operation.owning_patient() {
                if patient_id != caller.id() {
                    warn!(
                        "Denied {} for patient {}: records belong to {}",
                        operation,
                        caller.id(),
                        patient_id
                    );
                    return Err(PolicyError::AccessDenied(
                        "patients may only access their own consultations".to_string(),
                    ));
                }
            }
        }

        debug!("Allowed {} for {} account {}", operation, role, caller.id());
        Ok(())
    }
}
