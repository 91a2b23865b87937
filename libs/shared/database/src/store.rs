use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{Account, Consultation, Role};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Conflicting record: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Keyed access to registered accounts of every role.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// License number for doctors and nurses, tax id for patients.
    async fn exists_by_natural_key(&self, role: Role, key: &str) -> Result<bool, StoreError>;

    /// Inserts or replaces by id. Fails with `Conflict` when another
    /// account already owns the email.
    async fn save(&self, account: Account) -> Result<Account, StoreError>;

    async fn find_all_active(&self, role: Role) -> Result<Vec<Account>, StoreError>;

    /// Case-insensitive substring match on the account name.
    async fn search_active_by_name(&self, role: Role, name: &str) -> Result<Vec<Account>, StoreError>;

    async fn find_active_doctors_by_specialty(&self, specialty: &str) -> Result<Vec<Account>, StoreError>;

    async fn find_active_nurses_by_department(&self, department: &str) -> Result<Vec<Account>, StoreError>;
}

/// Consultation persistence. Unless stated otherwise lists are ordered by
/// scheduled datetime, most recent first.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Consultation>, StoreError>;

    /// Inserts or replaces by id; last writer wins.
    async fn save(&self, consultation: Consultation) -> Result<Consultation, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_all(&self) -> Result<Vec<Consultation>, StoreError>;

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Consultation>, StoreError>;

    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Consultation>, StoreError>;

    async fn find_by_doctors(&self, doctor_ids: &[Uuid]) -> Result<Vec<Consultation>, StoreError>;

    /// Both bounds inclusive.
    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, StoreError>;

    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Consultation>, StoreError>;

    /// Strictly after `after`, earliest first.
    async fn find_by_patient_after(
        &self,
        patient_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError>;
}
