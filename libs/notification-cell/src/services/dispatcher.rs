use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use crate::models::ConsultationEvent;
use crate::services::message::build_payload;
use crate::services::publisher::EventPublisher;
use crate::NotificationError;

/// Best-effort hand-off of lifecycle events to a background worker.
///
/// `dispatch` never blocks and never fails: a full or closed queue drops the
/// event with a warning. The worker logs publish failures and keeps going.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Option<mpsc::Sender<ConsultationEvent>>,
}

impl NotificationDispatcher {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(publisher: Arc<dyn EventPublisher>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        info!(
            "Starting notification worker with {} publisher (queue capacity {})",
            publisher.name(),
            capacity.max(1)
        );
        tokio::spawn(run_worker(receiver, publisher));

        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn dispatch(&self, event: ConsultationEvent) {
        let Some(sender) = &self.sender else {
            debug!("Notification dispatch disabled, skipping {}", event.topic());
            return;
        };

        let consultation_id = event.consultation.id;
        match sender.try_send(event) {
            Ok(()) => debug!("Queued notification for consultation {}", consultation_id),
            Err(TrySendError::Full(event)) => warn!(
                "Notification queue full, dropping {} for consultation {}",
                event.topic(),
                consultation_id
            ),
            Err(TrySendError::Closed(event)) => warn!(
                "{}, dropping {} for consultation {}",
                NotificationError::QueueClosed,
                event.topic(),
                consultation_id
            ),
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<ConsultationEvent>,
    publisher: Arc<dyn EventPublisher>,
) {
    debug!("Notification worker loop started");

    while let Some(event) = receiver.recv().await {
        if let Err(e) = deliver(publisher.as_ref(), &event).await {
            error!(
                "Failed to deliver {} for consultation {}: {}",
                event.topic(),
                event.consultation.id,
                e
            );
        }
    }

    debug!("Notification worker loop ended");
}

async fn deliver(publisher: &dyn EventPublisher, event: &ConsultationEvent) -> Result<(), NotificationError> {
    let payload = serde_json::to_string(&build_payload(event))?;
    publisher.publish(event.topic(), &payload).await
}
