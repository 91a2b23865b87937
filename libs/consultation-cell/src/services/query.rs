// libs/consultation-cell/src/services/query.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use security_cell::{AuthorizationPolicy, Operation};
use shared_database::{AccountStore, ConsultationStore};
use shared_models::account::Account;
use shared_models::consultation::{Consultation, ConsultationStats};

use crate::models::{ConsultationError, RECENT_WINDOW_DAYS};

/// Read-only views over consultations. Time-relative queries take the
/// evaluation instant from the caller.
pub struct ConsultationQueryService {
    consultations: Arc<dyn ConsultationStore>,
    accounts: Arc<dyn AccountStore>,
}

impl ConsultationQueryService {
    pub fn new(consultations: Arc<dyn ConsultationStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            consultations,
            accounts,
        }
    }

    #[instrument(skip(self, caller), fields(caller_id = %caller.id()))]
    pub async fn by_patient(
        &self,
        caller: &Account,
        patient_id: Uuid,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListConsultationsByPatient { patient_id })?;
        Ok(self.consultations.find_by_patient(patient_id).await?)
    }

    pub async fn my_consultations(&self, caller: &Account) -> Result<Vec<Consultation>, ConsultationError> {
        self.by_patient(caller, caller.id()).await
    }

    /// Strictly after `now`, earliest first.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id()))]
    pub async fn future_by_patient(
        &self,
        caller: &Account,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(
            caller,
            &Operation::ListFutureConsultationsByPatient { patient_id },
        )?;
        Ok(self.consultations.find_by_patient_after(patient_id, now).await?)
    }

    pub async fn full_history(
        &self,
        caller: &Account,
        patient_id: Uuid,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListPatientHistory)?;
        Ok(self.consultations.find_by_patient(patient_id).await?)
    }

    pub async fn by_doctor(
        &self,
        caller: &Account,
        doctor_id: Uuid,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListConsultationsByDoctor)?;
        Ok(self.consultations.find_by_doctor(doctor_id).await?)
    }

    pub async fn all(&self, caller: &Account) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListAllConsultations)?;
        Ok(self.consultations.find_all().await?)
    }

    /// Both bounds inclusive.
    pub async fn by_period(
        &self,
        caller: &Account,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListConsultationsByPeriod)?;
        if start > end {
            return Err(ConsultationError::Validation(
                "period start must not be after its end".to_string(),
            ));
        }
        Ok(self.consultations.find_between(start, end).await?)
    }

    pub async fn recent(
        &self,
        caller: &Account,
        now: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListRecentConsultations)?;
        let since = now - Duration::days(RECENT_WINDOW_DAYS);
        Ok(self.consultations.find_since(since).await?)
    }

    #[instrument(skip(self, caller), fields(caller_id = %caller.id()))]
    pub async fn by_specialty(
        &self,
        caller: &Account,
        specialty: &str,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ListConsultationsBySpecialty)?;

        let doctor_ids: Vec<Uuid> = self
            .accounts
            .find_active_doctors_by_specialty(specialty.trim())
            .await?
            .iter()
            .map(Account::id)
            .collect();

        if doctor_ids.is_empty() {
            debug!("No doctors practise {}", specialty);
            return Ok(Vec::new());
        }

        Ok(self.consultations.find_by_doctors(&doctor_ids).await?)
    }

    pub async fn statistics(
        &self,
        caller: &Account,
        now: DateTime<Utc>,
    ) -> Result<ConsultationStats, ConsultationError> {
        AuthorizationPolicy::authorize(caller, &Operation::ConsultationStatistics)?;

        let total_consultations = self.consultations.count().await?;
        let consultations_this_month = self.consultations.count_since(start_of_month(now)).await?;

        Ok(ConsultationStats {
            total_consultations,
            consultations_this_month,
        })
    }
}

/// Midnight UTC on the first day of `now`'s month.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(now)
}
