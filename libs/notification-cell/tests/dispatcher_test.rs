use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;
use uuid::Uuid;

use notification_cell::*;
use shared_models::consultation::Consultation;
use shared_utils::test_utils::TestAccounts;

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(String, NotificationPayload)>>,
}

impl RecordingPublisher {
    fn published(&self) -> Vec<(String, NotificationPayload)> {
        self.published.lock().unwrap().clone()
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

struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _topic: &str, _payload: &str) -> Result<(), NotificationError> {
        Err(NotificationError::Publish("broker unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Holds each publish until released.
#[derive(Default)]
struct GatedPublisher {
    release: Notify,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl GatedPublisher {
    async fn wait_until(counter: &AtomicUsize, count: usize) -> usize {
        for _ in 0..50 {
            if counter.load(Ordering::SeqCst) >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for GatedPublisher {
    async fn publish(&self, _topic: &str, _payload: &str) -> Result<(), NotificationError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

fn test_event(kind: ConsultationEventKind) -> ConsultationEvent {
    let patient = TestAccounts::patient("Ana", "ana@clinic.test");
    let doctor = TestAccounts::doctor("Paulo", "paulo@clinic.test");
    let nurse = TestAccounts::nurse("Nara", "nara@clinic.test");
    let now = Utc::now();

    let consultation = Consultation {
        id: Uuid::new_v4(),
        scheduled_at: now + chrono::Duration::days(2),
        reason: "follow-up".to_string(),
        diagnosis: None,
        prescription: None,
        notes: None,
        patient_id: patient.id(),
        doctor_id: doctor.id(),
        nurse_id: Some(nurse.id()),
        created_at: now,
        updated_at: now,
    };

    ConsultationEvent::new(kind, consultation, &patient, &doctor, Some(&nurse))
}

async fn wait_for(publisher: &RecordingPublisher, count: usize) -> Vec<(String, NotificationPayload)> {
    for _ in 0..50 {
        let published = publisher.published();
        if published.len() >= count {
            return published;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    publisher.published()
}

#[tokio::test]
async fn test_dispatched_events_reach_publisher_on_their_topic() {
    let publisher = Arc::new(RecordingPublisher::default());
    let dispatcher = NotificationDispatcher::spawn(publisher.clone(), 8);

    let created = test_event(ConsultationEventKind::Created);
    let updated = test_event(ConsultationEventKind::Updated);
    dispatcher.dispatch(created.clone());
    dispatcher.dispatch(updated.clone());

    let published = wait_for(&publisher, 2).await;
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, "consultation.created");
    assert_eq!(published[0].1.consultation_id, created.consultation.id);
    assert_eq!(published[0].1.nurse_id, created.consultation.nurse_id);
    assert_eq!(published[1].0, "consultation.updated");
    assert_eq!(published[1].1.recipient_email, "ana@clinic.test");
}

#[tokio::test]
async fn test_publish_failures_do_not_stop_the_worker() {
    let dispatcher = NotificationDispatcher::spawn(Arc::new(FailingPublisher), 4);

    for _ in 0..10 {
        dispatcher.dispatch(test_event(ConsultationEventKind::Created));
    }

    assert!(dispatcher.is_enabled());
}

#[tokio::test]
async fn test_disabled_dispatcher_is_a_noop() {
    let dispatcher = NotificationDispatcher::disabled();

    dispatcher.dispatch(test_event(ConsultationEventKind::Updated));
    assert!(!dispatcher.is_enabled());
}

#[tokio::test]
async fn test_noop_and_logging_publishers_accept_everything() {
    assert!(NoopPublisher.publish("consultation.created", "{}").await.is_ok());
    assert!(LoggingPublisher.publish("consultation.updated", "{}").await.is_ok());
}

#[tokio::test]
async fn test_full_queue_drops_events_without_blocking() {
    let publisher = Arc::new(GatedPublisher::default());
    let dispatcher = NotificationDispatcher::spawn(publisher.clone(), 1);

    // Worker takes the first event and stalls inside publish
    dispatcher.dispatch(test_event(ConsultationEventKind::Created));
    assert_eq!(GatedPublisher::wait_until(&publisher.started, 1).await, 1);

    // One more fits in the queue, the rest are dropped
    let started_at = Instant::now();
    for _ in 0..20 {
        dispatcher.dispatch(test_event(ConsultationEventKind::Updated));
    }
    assert!(started_at.elapsed() < Duration::from_secs(1));

    publisher.release.notify_one();
    assert_eq!(GatedPublisher::wait_until(&publisher.finished, 1).await, 1);
    publisher.release.notify_one();
    assert_eq!(GatedPublisher::wait_until(&publisher.finished, 2).await, 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(publisher.started.load(Ordering::SeqCst), 2);
}
