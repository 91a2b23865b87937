mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use uuid::Uuid;

use common::{FailingPublisher, Fixture};
use consultation_cell::*;
use shared_database::ConsultationStore;

#[tokio::test]
async fn test_scheduling_walkthrough() {
    let fx = Fixture::new().await;
    let lifecycle = &fx.state.lifecycle;
    let scheduled_at = Utc::now() + Duration::days(3);

    // Nurse schedules
    let created = lifecycle
        .create(&fx.nurse, fx.request_at(scheduled_at, "chest pain"))
        .await
        .unwrap();
    assert_eq!(created.patient_id, fx.patient.id());
    assert_eq!(created.doctor_id, fx.doctor.id());

    // Doctor records a diagnosis
    let updated = lifecycle
        .update(
            &fx.doctor,
            created.id,
            ClinicalFields {
                diagnosis: Some("arrhythmia".to_string()),
                ..ClinicalFields::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.reason, "chest pain");
    assert_eq!(updated.scheduled_at, scheduled_at);
    assert_eq!(updated.diagnosis.as_deref(), Some("arrhythmia"));

    let published = fx.publisher.wait_for(2).await;
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, "consultation.created");
    assert_eq!(published[0].1.patient_id, fx.patient.id());
    assert_eq!(published[0].1.doctor_id, fx.doctor.id());
    assert_eq!(published[1].0, "consultation.updated");
    assert!(published[1].1.message.contains("arrhythmia"));

    // Only the owning patient may read it
    assert_matches!(
        lifecycle.get_by_id(&fx.other_patient, created.id).await,
        Err(ConsultationError::AccessDenied(_))
    );
    assert_eq!(lifecycle.get_by_id(&fx.patient, created.id).await.unwrap().id, created.id);

    // Only a doctor may delete
    assert_matches!(
        lifecycle.delete(&fx.nurse, created.id).await,
        Err(ConsultationError::AccessDenied(_))
    );
    lifecycle.delete(&fx.doctor, created.id).await.unwrap();

    for caller in [&fx.doctor, &fx.nurse, &fx.patient] {
        assert_matches!(
            lifecycle.get_by_id(caller, created.id).await,
            Err(ConsultationError::NotFound(_))
        );
    }
}

#[tokio::test]
async fn test_missing_doctor_is_reference_not_found_and_stores_nothing() {
    let fx = Fixture::new().await;
    let mut request = fx.request_at(Utc::now(), "checkup");
    request.doctor_id = Uuid::new_v4();

    let result = fx.state.lifecycle.create(&fx.nurse, request).await;

    assert_matches!(result, Err(ConsultationError::ReferenceNotFound { kind: "doctor", .. }));
    assert_eq!(fx.consultations.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_references_must_have_the_right_role() {
    let fx = Fixture::new().await;

    let mut wrong_patient = fx.request_at(Utc::now(), "checkup");
    wrong_patient.patient_id = fx.doctor.id();
    assert_matches!(
        fx.state.lifecycle.create(&fx.doctor, wrong_patient).await,
        Err(ConsultationError::ReferenceNotFound { kind: "patient", .. })
    );

    let mut missing_nurse = fx.request_at(Utc::now(), "checkup");
    missing_nurse.nurse_id = Some(Uuid::new_v4());
    assert_matches!(
        fx.state.lifecycle.create(&fx.doctor, missing_nurse).await,
        Err(ConsultationError::ReferenceNotFound { kind: "nurse", .. })
    );
}

#[tokio::test]
async fn test_patients_cannot_create() {
    let fx = Fixture::new().await;

    let result = fx
        .state
        .lifecycle
        .create(&fx.patient, fx.request_at(Utc::now(), "checkup"))
        .await;

    assert_matches!(result, Err(ConsultationError::AccessDenied(_)));
    assert_eq!(fx.consultations.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_touches_only_clinical_fields() {
    let fx = Fixture::new().await;
    let mut request = fx.request_at(Utc::now() + Duration::days(1), "back pain");
    request.nurse_id = Some(fx.nurse.id());
    request.notes = Some("arrived early".to_string());
    let created = fx.state.lifecycle.create(&fx.nurse, request).await.unwrap();

    let updated = fx
        .state
        .lifecycle
        .update(
            &fx.doctor,
            created.id,
            ClinicalFields {
                diagnosis: Some("lumbar strain".to_string()),
                prescription: Some("rest".to_string()),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.scheduled_at, created.scheduled_at);
    assert_eq!(updated.reason, created.reason);
    assert_eq!(updated.patient_id, created.patient_id);
    assert_eq!(updated.doctor_id, created.doctor_id);
    assert_eq!(updated.nurse_id, created.nurse_id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.prescription.as_deref(), Some("rest"));
    assert_eq!(updated.notes, None);
}

#[tokio::test]
async fn test_update_checks_existence_before_role() {
    let fx = Fixture::new().await;
    let created = fx
        .state
        .lifecycle
        .create(&fx.doctor, fx.request_at(Utc::now(), "fever"))
        .await
        .unwrap();

    assert_matches!(
        fx.state
            .lifecycle
            .update(&fx.nurse, Uuid::new_v4(), ClinicalFields::default())
            .await,
        Err(ConsultationError::NotFound(_))
    );
    assert_matches!(
        fx.state
            .lifecycle
            .update(&fx.nurse, created.id, ClinicalFields::default())
            .await,
        Err(ConsultationError::AccessDenied(_))
    );
}

#[tokio::test]
async fn test_delete_of_missing_record_never_succeeds() {
    let fx = Fixture::new().await;
    let created = fx
        .state
        .lifecycle
        .create(&fx.doctor, fx.request_at(Utc::now(), "fever"))
        .await
        .unwrap();

    fx.state.lifecycle.delete(&fx.doctor, created.id).await.unwrap();

    for _ in 0..2 {
        assert_matches!(
            fx.state.lifecycle.delete(&fx.doctor, created.id).await,
            Err(ConsultationError::NotFound(_))
        );
    }
}

#[tokio::test]
async fn test_oversized_fields_are_rejected_before_persisting() {
    let fx = Fixture::new().await;
    let created = fx
        .state
        .lifecycle
        .create(&fx.doctor, fx.request_at(Utc::now(), "fever"))
        .await
        .unwrap();

    let result = fx
        .state
        .lifecycle
        .update(
            &fx.doctor,
            created.id,
            ClinicalFields {
                diagnosis: Some("x".repeat(MAX_DIAGNOSIS_LENGTH + 1)),
                ..ClinicalFields::default()
            },
        )
        .await;

    assert_matches!(result, Err(ConsultationError::Validation(_)));
    let stored = fx.consultations.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.diagnosis, None);
}

#[tokio::test]
async fn test_publish_failures_leave_mutations_committed() {
    let publisher = Arc::new(FailingPublisher::default());
    let fx = Fixture::with_publisher(publisher.clone()).await;
    let lifecycle = &fx.state.lifecycle;

    let created = lifecycle
        .create(&fx.nurse, fx.request_at(Utc::now() + Duration::days(1), "fever"))
        .await
        .unwrap();
    let updated = lifecycle
        .update(
            &fx.doctor,
            created.id,
            ClinicalFields {
                diagnosis: Some("influenza".to_string()),
                ..ClinicalFields::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(publisher.wait_for_attempts(2).await, 2);

    let stored = fx.consultations.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.reason, "fever");
    assert_eq!(stored.diagnosis.as_deref(), Some("influenza"));
    assert_eq!(stored.updated_at, updated.updated_at);
}
