use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::account::Account;
use shared_models::consultation::Consultation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationEventKind {
    Created,
    Updated,
}

impl ConsultationEventKind {
    pub fn topic(&self) -> &'static str {
        match self {
            ConsultationEventKind::Created => "consultation.created",
            ConsultationEventKind::Updated => "consultation.updated",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationEventKind::Created => "created",
            ConsultationEventKind::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Account> for Participant {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            name: account.name().to_string(),
            email: account.email().to_string(),
        }
    }
}

/// Snapshot of a consultation right after a lifecycle transition, with the
/// participant details needed to address the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationEvent {
    pub kind: ConsultationEventKind,
    pub consultation: Consultation,
    pub patient: Participant,
    pub doctor: Participant,
    pub nurse: Option<Participant>,
    pub occurred_at: DateTime<Utc>,
}

impl ConsultationEvent {
    pub fn new(
        kind: ConsultationEventKind,
        consultation: Consultation,
        patient: &Account,
        doctor: &Account,
        nurse: Option<&Account>,
    ) -> Self {
        Self {
            kind,
            consultation,
            patient: patient.into(),
            doctor: doctor.into(),
            nurse: nurse.map(Participant::from),
            occurred_at: Utc::now(),
        }
    }

    pub fn topic(&self) -> &'static str {
        self.kind.topic()
    }
}

/// Wire body published for every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub event: String,
    pub consultation_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub nurse_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub recipient_email: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}
