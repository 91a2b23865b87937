use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields every registered identity carries, whatever its role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCore {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountCore {
    pub fn new(name: String, email: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(flatten)]
    pub account: AccountCore,
    pub license_number: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nurse {
    #[serde(flatten)]
    pub account: AccountCore,
    pub license_number: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    #[serde(flatten)]
    pub account: AccountCore,
    pub tax_id: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A registered identity. The role is the variant tag and never changes
/// after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Account {
    Doctor(Doctor),
    Nurse(Nurse),
    Patient(Patient),
}

impl Account {
    pub fn core(&self) -> &AccountCore {
        match self {
            Account::Doctor(doctor) => &doctor.account,
            Account::Nurse(nurse) => &nurse.account,
            Account::Patient(patient) => &patient.account,
        }
    }

    pub fn core_mut(&mut self) -> &mut AccountCore {
        match self {
            Account::Doctor(doctor) => &mut doctor.account,
            Account::Nurse(nurse) => &mut nurse.account,
            Account::Patient(patient) => &mut patient.account,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Doctor(_) => Role::Doctor,
            Account::Nurse(_) => Role::Nurse,
            Account::Patient(_) => Role::Patient,
        }
    }

    pub fn id(&self) -> Uuid {
        self.core().id
    }

    pub fn name(&self) -> &str {
        &self.core().name
    }

    pub fn email(&self) -> &str {
        &self.core().email
    }

    pub fn is_active(&self) -> bool {
        self.core().active
    }

    /// License number for staff, tax id for patients.
    pub fn natural_key(&self) -> &str {
        match self {
            Account::Doctor(doctor) => &doctor.license_number,
            Account::Nurse(nurse) => &nurse.license_number,
            Account::Patient(patient) => &patient.tax_id,
        }
    }

    pub fn as_doctor(&self) -> Option<&Doctor> {
        match self {
            Account::Doctor(doctor) => Some(doctor),
            _ => None,
        }
    }

    pub fn as_nurse(&self) -> Option<&Nurse> {
        match self {
            Account::Nurse(nurse) => Some(nurse),
            _ => None,
        }
    }

    pub fn as_patient(&self) -> Option<&Patient> {
        match self {
            Account::Patient(patient) => Some(patient),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Account {
        Account::Doctor(Doctor {
            account: AccountCore::new(
                "Gregory House".to_string(),
                "house@clinic.test".to_string(),
                "$argon2id$secret".to_string(),
                Utc::now(),
            ),
            license_number: "CRM-1234".to_string(),
            specialty: "Diagnostics".to_string(),
        })
    }

    #[test]
    fn test_role_is_variant_tag() {
        let account = doctor();
        assert_eq!(account.role(), Role::Doctor);
        assert_eq!(account.natural_key(), "CRM-1234");
        assert!(account.as_patient().is_none());
    }

    #[test]
    fn test_serialization_hides_password_hash() {
        let value = serde_json::to_value(doctor()).unwrap();

        assert_eq!(value["role"], "doctor");
        assert_eq!(value["specialty"], "Diagnostics");
        assert_eq!(value["email"], "house@clinic.test");
        assert!(value.get("password_hash").is_none());
    }
}
