use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{Account, Consultation, Role};

use crate::store::{AccountStore, ConsultationStore, StoreError};

/// Process-local account store used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    async fn filter_active<F>(&self, role: Role, predicate: F) -> Vec<Account>
    where
        F: Fn(&Account) -> bool,
    {
        let accounts = self.accounts.read().await;
        let mut matches: Vec<Account> = accounts
            .values()
            .filter(|account| account.role() == role && account.is_active() && predicate(account))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name().cmp(b.name()));
        matches
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|account| account.email() == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().any(|account| account.email() == email))
    }

    async fn exists_by_natural_key(&self, role: Role, key: &str) -> Result<bool, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .any(|account| account.role() == role && account.natural_key() == key))
    }

    async fn save(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;

        let id = account.id();
        let email_taken = accounts
            .values()
            .any(|existing| existing.id() != id && existing.email() == account.email());
        if email_taken {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                account.email()
            )));
        }

        let natural_key_taken = accounts.values().any(|existing| {
            existing.id() != id
                && existing.role() == account.role()
                && existing.natural_key() == account.natural_key()
        });
        if natural_key_taken {
            return Err(StoreError::Conflict(format!(
                "{} identifier {} is already registered",
                account.role(),
                account.natural_key()
            )));
        }

        debug!("Saving {} account {}", account.role(), id);
        accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn find_all_active(&self, role: Role) -> Result<Vec<Account>, StoreError> {
        Ok(self.filter_active(role, |_| true).await)
    }

    async fn search_active_by_name(&self, role: Role, name: &str) -> Result<Vec<Account>, StoreError> {
        let needle = name.to_lowercase();
        Ok(self
            .filter_active(role, |account| account.name().to_lowercase().contains(&needle))
            .await)
    }

    async fn find_active_doctors_by_specialty(&self, specialty: &str) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .filter_active(Role::Doctor, |account| {
                account
                    .as_doctor()
                    .map(|doctor| doctor.specialty.eq_ignore_ascii_case(specialty))
                    .unwrap_or(false)
            })
            .await)
    }

    async fn find_active_nurses_by_department(&self, department: &str) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .filter_active(Role::Nurse, |account| {
                account
                    .as_nurse()
                    .and_then(|nurse| nurse.department.as_deref())
                    .map(|value| value.eq_ignore_ascii_case(department))
                    .unwrap_or(false)
            })
            .await)
    }
}

#[derive(Default)]
pub struct InMemoryConsultationStore {
    consultations: RwLock<HashMap<Uuid, Consultation>>,
}

impl InMemoryConsultationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, predicate: F) -> Vec<Consultation>
    where
        F: Fn(&Consultation) -> bool,
    {
        let consultations = self.consultations.read().await;
        let mut matches: Vec<Consultation> = consultations
            .values()
            .filter(|consultation| predicate(consultation))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        matches
    }
}

#[async_trait]
impl ConsultationStore for InMemoryConsultationStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Consultation>, StoreError> {
        Ok(self.consultations.read().await.get(&id).cloned())
    }

    async fn save(&self, consultation: Consultation) -> Result<Consultation, StoreError> {
        let mut consultations = self.consultations.write().await;
        consultations.insert(consultation.id, consultation.clone());
        Ok(consultation)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.consultations.write().await.remove(&id).is_some())
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.consultations.read().await.contains_key(&id))
    }

    async fn find_all(&self) -> Result<Vec<Consultation>, StoreError> {
        Ok(self.select(|_| true).await)
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Consultation>, StoreError> {
        Ok(self.select(|c| c.patient_id == patient_id).await)
    }

    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Consultation>, StoreError> {
        Ok(self.select(|c| c.doctor_id == doctor_id).await)
    }

    async fn find_by_doctors(&self, doctor_ids: &[Uuid]) -> Result<Vec<Consultation>, StoreError> {
        Ok(self.select(|c| doctor_ids.contains(&c.doctor_id)).await)
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, StoreError> {
        Ok(self
            .select(|c| c.scheduled_at >= start && c.scheduled_at <= end)
            .await)
    }

    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Consultation>, StoreError> {
        Ok(self.select(|c| c.scheduled_at >= since).await)
    }

    async fn find_by_patient_after(
        &self,
        patient_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, StoreError> {
        let mut upcoming = self
            .select(|c| c.patient_id == patient_id && c.scheduled_at > after)
            .await;
        upcoming.reverse();
        Ok(upcoming)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.consultations.read().await.len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let consultations = self.consultations.read().await;
        Ok(consultations
            .values()
            .filter(|c| c.scheduled_at >= since)
            .count() as u64)
    }
}
