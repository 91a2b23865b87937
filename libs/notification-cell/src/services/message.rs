use crate::models::{ConsultationEvent, ConsultationEventKind, NotificationPayload};

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Human-readable text addressed to the patient.
pub fn format_message(event: &ConsultationEvent) -> String {
    let scheduled = event.consultation.scheduled_at.format(DATE_FORMAT);

    match event.kind {
        ConsultationEventKind::Created => format!(
            "Hello {}! Your consultation was scheduled for {} with Dr. {}. Reason: {}",
            event.patient.name, scheduled, event.doctor.name, event.consultation.reason
        ),
        ConsultationEventKind::Updated => format!(
            "Hello {}! Your consultation on {} was updated. Diagnosis: {}",
            event.patient.name,
            scheduled,
            event
                .consultation
                .diagnosis
                .as_deref()
                .unwrap_or("Under review")
        ),
    }
}

pub fn build_payload(event: &ConsultationEvent) -> NotificationPayload {
    let consultation = &event.consultation;

    NotificationPayload {
        event: event.kind.as_str().to_string(),
        consultation_id: consultation.id,
        patient_id: consultation.patient_id,
        doctor_id: consultation.doctor_id,
        nurse_id: consultation.nurse_id,
        scheduled_at: consultation.scheduled_at,
        recipient_email: event.patient.email.clone(),
        message: format_message(event),
        occurred_at: event.occurred_at,
    }
}
