use std::sync::Arc;

use assert_matches::assert_matches;

use auth_cell::*;
use shared_database::{AccountStore, InMemoryAccountStore};
use shared_models::account::Role;
use shared_utils::test_utils::{JwtTestUtils, TestAccounts, TestConfig};

fn setup() -> (Arc<InMemoryAccountStore>, Arc<AuthService>, RegistrationService) {
    let store = Arc::new(InMemoryAccountStore::new());
    let auth = Arc::new(AuthService::new(store.clone(), TestConfig::default().to_arc()));
    let registration = RegistrationService::new(auth.clone());
    (store, auth, registration)
}

fn patient_request(email: &str, tax_id: &str) -> RegisterPatientRequest {
    RegisterPatientRequest {
        name: "Ana Souza".to_string(),
        email: email.to_string(),
        password: "secret123".to_string(),
        tax_id: tax_id.to_string(),
        birth_date: None,
        phone: Some("11999990000".to_string()),
        address: None,
    }
}

fn doctor_request(email: &str, license: &str) -> RegisterDoctorRequest {
    RegisterDoctorRequest {
        name: "Paulo Lima".to_string(),
        email: email.to_string(),
        password: "secret123".to_string(),
        license_number: license.to_string(),
        specialty: "Cardiology".to_string(),
    }
}

#[tokio::test]
async fn test_register_then_login_round_trip() {
    let (_, auth, registration) = setup();

    let account = registration
        .register_patient(patient_request("Ana@Clinic.Test ", "12345678901"))
        .await
        .unwrap();
    assert_eq!(account.email(), "ana@clinic.test");
    assert_eq!(account.role(), Role::Patient);
    assert!(account.is_active());
    assert_ne!(account.core().password_hash, "secret123");

    let payload = auth.login("ana@clinic.test", "secret123").await.unwrap();
    assert_eq!(payload.account.id(), account.id());
    assert!(auth.validate_token(&payload.token));

    let resolved = auth.resolve_token(&payload.token).await.unwrap();
    assert_eq!(resolved.id(), account.id());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_and_stored_once() {
    let (store, _, registration) = setup();

    registration
        .register_patient(patient_request("dup@clinic.test", "12345678901"))
        .await
        .unwrap();
    let second = registration
        .register_doctor(doctor_request("dup@clinic.test", "CRM-5555"))
        .await;

    assert_matches!(second, Err(AuthError::EmailAlreadyUsed));
    assert_eq!(store.len().await, 1);
    assert!(store.find_by_email("dup@clinic.test").await.unwrap().is_some());
}

#[tokio::test]
async fn test_duplicate_license_number_is_rejected() {
    let (_, _, registration) = setup();

    registration
        .register_doctor(doctor_request("first@clinic.test", "CRM-1234"))
        .await
        .unwrap();
    let second = registration
        .register_doctor(doctor_request("second@clinic.test", "CRM-1234"))
        .await;

    assert_matches!(
        second,
        Err(AuthError::DuplicateNaturalKey { field: "license number", .. })
    );
}

#[tokio::test]
async fn test_registration_validates_fields() {
    let (_, _, registration) = setup();

    let short_tax_id = registration
        .register_patient(patient_request("p@clinic.test", "123"))
        .await;
    assert_matches!(short_tax_id, Err(AuthError::Validation(_)));

    let mut no_specialty = doctor_request("d@clinic.test", "CRM-9876");
    no_specialty.specialty = "  ".to_string();
    assert_matches!(
        registration.register_doctor(no_specialty).await,
        Err(AuthError::Validation(_))
    );

    let nurse = RegisterNurseRequest {
        name: "Nara".to_string(),
        email: "nara@clinic.test".to_string(),
        password: "12345".to_string(),
        license_number: "COREN-1".to_string(),
        department: None,
    };
    assert_matches!(registration.register_nurse(nurse).await, Err(AuthError::Validation(_)));
}

#[tokio::test]
async fn test_login_failures_are_invalid_credentials() {
    let (_, auth, registration) = setup();
    registration
        .register_patient(patient_request("ana@clinic.test", "12345678901"))
        .await
        .unwrap();

    assert_matches!(
        auth.login("ana@clinic.test", "wrong-password").await,
        Err(AuthError::InvalidCredentials)
    );
    assert_matches!(
        auth.login("nobody@clinic.test", "secret123").await,
        Err(AuthError::InvalidCredentials)
    );
}

#[tokio::test]
async fn test_inactive_account_cannot_log_in() {
    let (store, auth, registration) = setup();
    let mut account = registration
        .register_patient(patient_request("ana@clinic.test", "12345678901"))
        .await
        .unwrap();

    account.core_mut().active = false;
    store.save(account).await.unwrap();

    assert_matches!(
        auth.login("ana@clinic.test", "secret123").await,
        Err(AuthError::InvalidCredentials)
    );
}

#[tokio::test]
async fn test_token_for_deleted_account_does_not_resolve() {
    let (_, auth, _) = setup();
    let config = TestConfig::default();
    let ghost = TestAccounts::doctor("Ghost", "ghost@clinic.test");
    let token = JwtTestUtils::create_test_token(&ghost, &config.jwt_secret, Some(1));

    assert!(auth.validate_token(&token));
    assert_matches!(auth.resolve_token(&token).await, Err(AuthError::AccountNotFound));
}

#[tokio::test]
async fn test_bad_tokens_are_invalid() {
    let (_, auth, _) = setup();
    let config = TestConfig::default();
    let account = TestAccounts::nurse("Nara", "nara@clinic.test");

    let expired = JwtTestUtils::create_expired_token(&account, &config.jwt_secret);
    let forged = JwtTestUtils::create_invalid_signature_token(&account);

    assert!(!auth.validate_token(&expired));
    assert!(!auth.validate_token(&forged));
    assert!(!auth.validate_token(&JwtTestUtils::create_malformed_token()));
    assert_matches!(auth.resolve_token(&forged).await, Err(AuthError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_directory_is_staff_only() {
    let (store, _, _) = setup();
    let directory = DirectoryService::new(store.clone());

    let doctor = store
        .save(TestAccounts::doctor_with_specialty("Paulo Lima", "paulo@clinic.test", "Cardiology"))
        .await
        .unwrap();
    store
        .save(TestAccounts::doctor_with_specialty("Rita Alves", "rita@clinic.test", "Dermatology"))
        .await
        .unwrap();
    let nurse = store.save(TestAccounts::nurse("Nara", "nara@clinic.test")).await.unwrap();
    let patient = store.save(TestAccounts::patient("Ana", "ana@clinic.test")).await.unwrap();

    assert_eq!(directory.list_doctors(&nurse).await.unwrap().len(), 2);
    assert_eq!(directory.list_patients(&doctor).await.unwrap().len(), 1);
    assert_matches!(directory.list_nurses(&patient).await, Err(AuthError::AccessDenied(_)));

    let by_specialty = directory
        .search_doctors(&nurse, None, Some("cardiology"))
        .await
        .unwrap();
    assert_eq!(by_specialty.len(), 1);
    assert_eq!(by_specialty[0].id(), doctor.id());

    // name wins over specialty
    let by_name = directory
        .search_doctors(&nurse, Some("rita"), Some("Cardiology"))
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name(), "Rita Alves");
}

#[tokio::test]
async fn test_login_with_out_of_range_token_lifetime_fails_cleanly() {
    let store = Arc::new(InMemoryAccountStore::new());
    let config = TestConfig {
        token_ttl_hours: 9_000_000_000_000,
        ..TestConfig::default()
    };
    let auth = Arc::new(AuthService::new(store, config.to_arc()));
    RegistrationService::new(auth.clone())
        .register_patient(patient_request("ana@clinic.test", "12345678901"))
        .await
        .unwrap();

    let result = auth.login("ana@clinic.test", "secret123").await;

    assert_matches!(result, Err(AuthError::Internal(_)));
}
