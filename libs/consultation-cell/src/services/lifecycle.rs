// libs/consultation-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{ConsultationEvent, ConsultationEventKind, NotificationDispatcher};
use security_cell::{AuthorizationPolicy, Operation};
use shared_database::{AccountStore, ConsultationStore};
use shared_models::account::{Account, Role};
use shared_models::consultation::Consultation;

use crate::models::{ClinicalFields, ConsultationError, CreateConsultationRequest};

/// Create, update, delete and single reads of consultations. Every mutation
/// is persisted before its notification is handed to the dispatcher.
pub struct ConsultationLifecycleService {
    consultations: Arc<dyn ConsultationStore>,
    accounts: Arc<dyn AccountStore>,
    notifications: NotificationDispatcher,
}

impl ConsultationLifecycleService {
    pub fn new(
        consultations: Arc<dyn ConsultationStore>,
        accounts: Arc<dyn AccountStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            consultations,
            accounts,
            notifications,
        }
    }

    #[instrument(skip(self, caller, request), fields(caller_id = %caller.id()))]
    pub async fn create(
        &self,
        caller: &Account,
        request: CreateConsultationRequest,
    ) -> Result<Consultation, ConsultationError> {
        request.validate()?;

        let patient = self.resolve_reference(Role::Patient, request.patient_id).await?;
        let doctor = self.resolve_reference(Role::Doctor, request.doctor_id).await?;
        let nurse = match request.nurse_id {
            Some(nurse_id) => Some(self.resolve_reference(Role::Nurse, nurse_id).await?),
            None => None,
        };

        AuthorizationPolicy::authorize(caller, &Operation::CreateConsultation)?;

        let now = Utc::now();
        let consultation = Consultation {
            id: Uuid::new_v4(),
            scheduled_at: request.scheduled_at,
            reason: request.reason.trim().to_string(),
            diagnosis: request.diagnosis,
            prescription: request.prescription,
            notes: request.notes,
            patient_id: patient.id(),
            doctor_id: doctor.id(),
            nurse_id: nurse.as_ref().map(Account::id),
            created_at: now,
            updated_at: now,
        };

        let saved = self.consultations.save(consultation).await?;
        info!(
            "Consultation {} scheduled for patient {} with doctor {}",
            saved.id, saved.patient_id, saved.doctor_id
        );

        self.notifications.dispatch(ConsultationEvent::new(
            ConsultationEventKind::Created,
            saved.clone(),
            &patient,
            &doctor,
            nurse.as_ref(),
        ));

        Ok(saved)
    }

    /// Overwrites diagnosis, prescription and notes. Date, reason and
    /// participants never change here.
    #[instrument(skip(self, caller, fields), fields(caller_id = %caller.id()))]
    pub async fn update(
        &self,
        caller: &Account,
        id: Uuid,
        fields: ClinicalFields,
    ) -> Result<Consultation, ConsultationError> {
        let mut consultation = self
            .consultations
            .find_by_id(id)
            .await?
            .ok_or(ConsultationError::NotFound(id))?;

        AuthorizationPolicy::authorize(caller, &Operation::UpdateConsultation)?;
        fields.validate()?;

        fields.apply_to(&mut consultation);
        consultation.updated_at = Utc::now().max(consultation.updated_at);

        let saved = self.consultations.save(consultation).await?;
        info!("Consultation {} updated by {}", saved.id, caller.id());

        self.notify_updated(&saved).await;

        Ok(saved)
    }

    #[instrument(skip(self, caller), fields(caller_id = %caller.id()))]
    pub async fn delete(&self, caller: &Account, id: Uuid) -> Result<(), ConsultationError> {
        if !self.consultations.exists_by_id(id).await? {
            return Err(ConsultationError::NotFound(id));
        }

        AuthorizationPolicy::authorize(caller, &Operation::DeleteConsultation)?;

        // A concurrent delete may have won between the check and here
        if !self.consultations.delete_by_id(id).await? {
            return Err(ConsultationError::NotFound(id));
        }

        info!("Consultation {} deleted by {}", id, caller.id());
        Ok(())
    }

    pub async fn get_by_id(&self, caller: &Account, id: Uuid) -> Result<Consultation, ConsultationError> {
        let consultation = self
            .consultations
            .find_by_id(id)
            .await?
            .ok_or(ConsultationError::NotFound(id))?;

        AuthorizationPolicy::authorize(
            caller,
            &Operation::ReadConsultation {
                patient_id: consultation.patient_id,
            },
        )?;

        Ok(consultation)
    }

    async fn resolve_reference(&self, role: Role, id: Uuid) -> Result<Account, ConsultationError> {
        match self.accounts.find_by_id(id).await? {
            Some(account) if account.role() == role => Ok(account),
            Some(account) => {
                debug!("Account {} is a {}, expected {}", id, account.role(), role);
                Err(ConsultationError::ReferenceNotFound { kind: role.as_str(), id })
            }
            None => Err(ConsultationError::ReferenceNotFound { kind: role.as_str(), id }),
        }
    }

    // Participant lookup failures only cost the notification, never the update
    async fn notify_updated(&self, consultation: &Consultation) {
        let patient = self.accounts.find_by_id(consultation.patient_id).await;
        let doctor = self.accounts.find_by_id(consultation.doctor_id).await;
        let nurse = match consultation.nurse_id {
            Some(nurse_id) => self.accounts.find_by_id(nurse_id).await.ok().flatten(),
            None => None,
        };

        match (patient, doctor) {
            (Ok(Some(patient)), Ok(Some(doctor))) => {
                self.notifications.dispatch(ConsultationEvent::new(
                    ConsultationEventKind::Updated,
                    consultation.clone(),
                    &patient,
                    &doctor,
                    nurse.as_ref(),
                ));
            }
            _ => warn!(
                "Skipping update notification for consultation {}: participants unavailable",
                consultation.id
            ),
        }
    }
}
