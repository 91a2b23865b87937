use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::account::{Account, AccountCore, Doctor, Nurse, Patient};
use shared_models::auth::JwtClaims;

use crate::jwt::encode_claims;

pub struct TestConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            token_ttl_hours: 24,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: self.token_ttl_hours,
            notifications_enabled: false,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Ready-made accounts with unique license numbers and tax ids.
pub struct TestAccounts;

impl TestAccounts {
    fn core(name: &str, email: &str) -> AccountCore {
        AccountCore::new(
            name.to_string(),
            email.to_string(),
            "not-a-real-hash".to_string(),
            Utc::now(),
        )
    }

    fn unique_digits(len: usize) -> String {
        Uuid::new_v4()
            .as_u128()
            .to_string()
            .chars()
            .take(len)
            .collect()
    }

    pub fn doctor(name: &str, email: &str) -> Account {
        Self::doctor_with_specialty(name, email, "General Practice")
    }

    pub fn doctor_with_specialty(name: &str, email: &str, specialty: &str) -> Account {
        Account::Doctor(Doctor {
            account: Self::core(name, email),
            license_number: format!("CRM-{}", Self::unique_digits(8)),
            specialty: specialty.to_string(),
        })
    }

    pub fn nurse(name: &str, email: &str) -> Account {
        Account::Nurse(Nurse {
            account: Self::core(name, email),
            license_number: format!("COREN-{}", Self::unique_digits(8)),
            department: Some("Triage".to_string()),
        })
    }

    pub fn patient(name: &str, email: &str) -> Account {
        Account::Patient(Patient {
            account: Self::core(name, email),
            tax_id: Self::unique_digits(11),
            birth_date: None,
            phone: Some("+5511999990000".to_string()),
            address: None,
        })
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(account: &Account, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = JwtClaims {
            sub: account.email().to_string(),
            uid: account.id().to_string(),
            role: account.role(),
            iat: now.timestamp() as u64,
            exp: exp.timestamp().max(0) as u64,
        };

        encode_claims(&claims, secret).expect("test claims always encode")
    }

    pub fn create_expired_token(account: &Account, secret: &str) -> String {
        Self::create_test_token(account, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(account: &Account) -> String {
        Self::create_test_token(account, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}
