#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use consultation_cell::{ConsultationState, CreateConsultationRequest};
use notification_cell::{EventPublisher, NotificationDispatcher, NotificationError, NotificationPayload};
use shared_database::{AccountStore, InMemoryAccountStore, InMemoryConsultationStore};
use shared_models::account::Account;
use shared_utils::test_utils::TestAccounts;

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, NotificationPayload)>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(String, NotificationPayload)> {
        self.published.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, count: usize) -> Vec<(String, NotificationPayload)> {
        for _ in 0..50 {
            if self.published().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.published()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), NotificationError> {
        let payload: NotificationPayload = serde_json::from_str(payload)?;
        self.published.lock().unwrap().push((topic.to_string(), payload));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Rejects every event, counting the attempts.
#[derive(Default)]
pub struct FailingPublisher {
    attempts: AtomicUsize,
}

impl FailingPublisher {
    pub async fn wait_for_attempts(&self, count: usize) -> usize {
        for _ in 0..50 {
            if self.attempts.load(Ordering::SeqCst) >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _topic: &str, _payload: &str) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotificationError::Publish("broker unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub struct Fixture {
    pub accounts: Arc<InMemoryAccountStore>,
    pub consultations: Arc<InMemoryConsultationStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub state: Arc<ConsultationState>,
    pub doctor: Account,
    pub nurse: Account,
    pub patient: Account,
    pub other_patient: Account,
}

impl Fixture {
    pub async fn new() -> Self {
        let publisher = Arc::new(RecordingPublisher::default());
        let dispatcher = NotificationDispatcher::spawn(publisher.clone(), 16);
        Self::build(publisher, dispatcher).await
    }

    /// Events go to `publisher`; the recording publisher stays empty.
    pub async fn with_publisher(publisher: Arc<dyn EventPublisher>) -> Self {
        let dispatcher = NotificationDispatcher::spawn(publisher, 16);
        Self::build(Arc::new(RecordingPublisher::default()), dispatcher).await
    }

    async fn build(publisher: Arc<RecordingPublisher>, dispatcher: NotificationDispatcher) -> Self {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let consultations = Arc::new(InMemoryConsultationStore::new());

        let doctor = accounts
            .save(TestAccounts::doctor_with_specialty("Paulo Lima", "paulo@clinic.test", "Cardiology"))
            .await
            .unwrap();
        let nurse = accounts
            .save(TestAccounts::nurse("Nara Costa", "nara@clinic.test"))
            .await
            .unwrap();
        let patient = accounts
            .save(TestAccounts::patient("Ana Souza", "ana@clinic.test"))
            .await
            .unwrap();
        let other_patient = accounts
            .save(TestAccounts::patient("Bruno Dias", "bruno@clinic.test"))
            .await
            .unwrap();

        let state = Arc::new(ConsultationState::new(
            consultations.clone(),
            accounts.clone(),
            dispatcher,
        ));

        Self {
            accounts,
            consultations,
            publisher,
            state,
            doctor,
            nurse,
            patient,
            other_patient,
        }
    }

    pub fn request_at(&self, scheduled_at: DateTime<Utc>, reason: &str) -> CreateConsultationRequest {
        CreateConsultationRequest {
            scheduled_at,
            reason: reason.to_string(),
            diagnosis: None,
            prescription: None,
            notes: None,
            patient_id: self.patient.id(),
            doctor_id: self.doctor.id(),
            nurse_id: None,
        }
    }
}
