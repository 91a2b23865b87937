// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// =====================================================================================
// AUTHORIZATION MODELS
// =====================================================================================

/// Every operation guarded by the authorization policy. Operations scoped
/// to one patient carry that patient's id so ownership can be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    CreateConsultation,
    UpdateConsultation,
    DeleteConsultation,
    ReadConsultation { patient_id: Uuid },
    ListConsultationsByPatient { patient_id: Uuid },
    ListFutureConsultationsByPatient { patient_id: Uuid },
    ListPatientHistory,
    ListConsultationsByDoctor,
    ListAllConsultations,
    ListConsultationsByPeriod,
    ListRecentConsultations,
    ListConsultationsBySpecialty,
    ConsultationStatistics,
    BrowseDirectory,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateConsultation => "create consultation",
            Operation::UpdateConsultation => "update consultation",
            Operation::DeleteConsultation => "delete consultation",
            Operation::ReadConsultation { .. } => "read consultation",
            Operation::ListConsultationsByPatient { .. } => "list consultations by patient",
            Operation::ListFutureConsultationsByPatient { .. } => "list future consultations by patient",
            Operation::ListPatientHistory => "list patient history",
            Operation::ListConsultationsByDoctor => "list consultations by doctor",
            Operation::ListAllConsultations => "list all consultations",
            Operation::ListConsultationsByPeriod => "list consultations by period",
            Operation::ListRecentConsultations => "list recent consultations",
            Operation::ListConsultationsBySpecialty => "list consultations by specialty",
            Operation::ConsultationStatistics => "consultation statistics",
            Operation::BrowseDirectory => "browse account directory",
        }
    }

    /// Patient whose records the operation touches, when a patient caller
    /// must own them.
    pub fn owning_patient(&self) -> Option<Uuid> {
        match self {
            Operation::ReadConsultation { patient_id }
            | Operation::ListConsultationsByPatient { patient_id }
            | Operation::ListFutureConsultationsByPatient { patient_id } => Some(*patient_id),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Access denied: {0}")]
    AccessDenied(String),
}
