use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use shared_database::AccountStore;
use shared_models::account::Account;
use shared_models::consultation::Consultation;

use crate::models::{ConsultationDetails, ConsultationError, ParticipantSummary};

/// Expands consultations with participant summaries from the account store.
pub struct ConsultationDetailsService {
    accounts: Arc<dyn AccountStore>,
}

impl ConsultationDetailsService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub async fn expand(&self, consultation: Consultation) -> Result<ConsultationDetails, ConsultationError> {
        let mut expanded = self.expand_all(vec![consultation]).await?;
        expanded
            .pop()
            .ok_or_else(|| ConsultationError::Storage("consultation expansion returned nothing".to_string()))
    }

    /// Each participant is fetched once per call, however many rows mention it.
    pub async fn expand_all(
        &self,
        consultations: Vec<Consultation>,
    ) -> Result<Vec<ConsultationDetails>, ConsultationError> {
        let mut cache: HashMap<Uuid, Option<Account>> = HashMap::new();
        let mut expanded = Vec::with_capacity(consultations.len());

        for consultation in consultations {
            let patient = self.summary(&mut cache, Some(consultation.patient_id)).await?;
            let doctor = self.summary(&mut cache, Some(consultation.doctor_id)).await?;
            let nurse = self.summary(&mut cache, consultation.nurse_id).await?;

            expanded.push(ConsultationDetails {
                consultation,
                patient,
                doctor,
                nurse,
            });
        }

        Ok(expanded)
    }

    async fn summary(
        &self,
        cache: &mut HashMap<Uuid, Option<Account>>,
        id: Option<Uuid>,
    ) -> Result<Option<ParticipantSummary>, ConsultationError> {
        let Some(id) = id else {
            return Ok(None);
        };

        if !cache.contains_key(&id) {
            let account = self.accounts.find_by_id(id).await?;
            cache.insert(id, account);
        }

        Ok(cache
            .get(&id)
            .and_then(|account| account.as_ref())
            .map(ParticipantSummary::from))
    }
}
