use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Method, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Account, AccountCore, Consultation, Doctor, Nurse, Patient, Role};

use crate::store::{AccountStore, ConsultationStore, StoreError};

const ACCOUNTS_PATH: &str = "/rest/v1/accounts";
const CONSULTATIONS_PATH: &str = "/rest/v1/consultations";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| StoreError::Backend("Invalid Supabase service key".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| StoreError::Backend("Invalid Supabase service key".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = check_status(req.send().await?).await?;

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Exact row count from the `Content-Range` total, unaffected by the
    /// server's `max-rows` cap.
    async fn count(&self, table: &str, query: &str) -> Result<u64, StoreError> {
        let url = format!("{}{}?{}", self.base_url, table, query);
        debug!("Counting rows at {}", url);

        let mut headers = self.get_headers()?;
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.client.request(Method::HEAD, &url).headers(headers).send().await?;
        let response = check_status(response).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(content_range_total)
            .ok_or_else(|| StoreError::Backend("missing row count in Content-Range".to_string()))
    }

    async fn select<T>(&self, table: &str, query: &str) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = format!("{}?{}", table, query);
        self.request(Method::GET, &path, None).await
    }

    async fn upsert<T>(&self, table: &str, row: &T) -> Result<Vec<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let body = serde_json::to_value(row)?;
        let path = format!("{}?on_conflict=id", table);
        self.request_with_headers(Method::POST, &path, Some(body), Some(headers)).await
    }

    async fn delete(&self, table: &str, query: &str) -> Result<Vec<Value>, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let path = format!("{}?{}", table, query);
        self.request_with_headers(Method::DELETE, &path, None, Some(headers)).await
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    error!("PostgREST error ({}): {}", status, error_text);

    Err(match status.as_u16() {
        409 => StoreError::Conflict(error_text),
        _ => StoreError::Backend(format!("API error ({}): {}", status, error_text)),
    })
}

/// `0-24/3573` and `*/3573` both yield 3573; an unknown total (`*/*`) yields `None`.
fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn encode_time(value: DateTime<Utc>) -> String {
    encode(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Escapes LIKE metacharacters so the value only matches itself. PostgREST
/// treats `*` as `%`, so it is escaped as well.
fn escape_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ==============================================================================
// ACCOUNTS
// ==============================================================================

/// Flat row shape of the `accounts` table; role-specific columns are null
/// for the other roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub license_number: Option<String>,
    pub specialty: Option<String>,
    pub department: Option<String>,
    pub tax_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        let core = account.core();
        let mut row = AccountRow {
            id: core.id,
            role: account.role(),
            name: core.name.clone(),
            email: core.email.clone(),
            password_hash: core.password_hash.clone(),
            active: core.active,
            created_at: core.created_at,
            updated_at: core.updated_at,
            license_number: None,
            specialty: None,
            department: None,
            tax_id: None,
            birth_date: None,
            phone: None,
            address: None,
        };

        match account {
            Account::Doctor(doctor) => {
                row.license_number = Some(doctor.license_number.clone());
                row.specialty = Some(doctor.specialty.clone());
            }
            Account::Nurse(nurse) => {
                row.license_number = Some(nurse.license_number.clone());
                row.department = nurse.department.clone();
            }
            Account::Patient(patient) => {
                row.tax_id = Some(patient.tax_id.clone());
                row.birth_date = patient.birth_date;
                row.phone = patient.phone.clone();
                row.address = patient.address.clone();
            }
        }

        row
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let missing = |column: &str| {
            StoreError::Backend(format!("account {} has no {}", row.id, column))
        };

        let account = AccountCore {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
            password_hash: row.password_hash.clone(),
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        Ok(match row.role {
            Role::Doctor => Account::Doctor(Doctor {
                account,
                license_number: row.license_number.clone().ok_or_else(|| missing("license_number"))?,
                specialty: row.specialty.clone().ok_or_else(|| missing("specialty"))?,
            }),
            Role::Nurse => Account::Nurse(Nurse {
                account,
                license_number: row.license_number.clone().ok_or_else(|| missing("license_number"))?,
                department: row.department.clone(),
            }),
            Role::Patient => Account::Patient(Patient {
                account,
                tax_id: row.tax_id.clone().ok_or_else(|| missing("tax_id"))?,
                birth_date: row.birth_date,
                phone: row.phone.clone(),
                address: row.address.clone(),
            }),
        })
    }
}

fn into_accounts(rows: Vec<AccountRow>) -> Result<Vec<Account>, StoreError> {
    rows.into_iter().map(Account::try_from).collect()
}

pub struct SupabaseAccountStore {
    supabase: SupabaseClient,
}

impl SupabaseAccountStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn first(&self, query: &str) -> Result<Option<Account>, StoreError> {
        let rows: Vec<AccountRow> = self.supabase.select(ACCOUNTS_PATH, query).await?;
        rows.into_iter().next().map(Account::try_from).transpose()
    }

    async fn any(&self, query: &str) -> Result<bool, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .select(ACCOUNTS_PATH, &format!("select=id&{}&limit=1", query))
            .await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl AccountStore for SupabaseAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.first(&format!("id=eq.{}&limit=1", id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.first(&format!("email=eq.{}&limit=1", encode(email))).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        self.any(&format!("email=eq.{}", encode(email))).await
    }

    async fn exists_by_natural_key(&self, role: Role, key: &str) -> Result<bool, StoreError> {
        let column = match role {
            Role::Doctor | Role::Nurse => "license_number",
            Role::Patient => "tax_id",
        };
        self.any(&format!("role=eq.{}&{}=eq.{}", role, column, encode(key))).await
    }

    async fn save(&self, account: Account) -> Result<Account, StoreError> {
        let row = AccountRow::from(&account);
        let saved = self.supabase.upsert(ACCOUNTS_PATH, &row).await?;

        match saved.into_iter().next() {
            Some(row) => Account::try_from(row),
            None => Err(StoreError::Backend(format!("account {} was not returned after save", account.id()))),
        }
    }

    async fn find_all_active(&self, role: Role) -> Result<Vec<Account>, StoreError> {
        let rows = self
            .supabase
            .select(ACCOUNTS_PATH, &format!("role=eq.{}&active=is.true&order=name.asc", role))
            .await?;
        into_accounts(rows)
    }

    async fn search_active_by_name(&self, role: Role, name: &str) -> Result<Vec<Account>, StoreError> {
        let query = format!(
            "role=eq.{}&active=is.true&name=ilike.{}&order=name.asc",
            role,
            encode(&format!("*{}*", escape_pattern(name)))
        );
        let needle = name.to_lowercase();
        let accounts = into_accounts(self.supabase.select(ACCOUNTS_PATH, &query).await?)?;

        Ok(accounts
            .into_iter()
            .filter(|account| account.name().to_lowercase().contains(&needle))
            .collect())
    }

    async fn find_active_doctors_by_specialty(&self, specialty: &str) -> Result<Vec<Account>, StoreError> {
        let query = format!(
            "role=eq.doctor&active=is.true&specialty=ilike.{}&order=name.asc",
            encode(&escape_pattern(specialty))
        );
        let accounts = into_accounts(self.supabase.select(ACCOUNTS_PATH, &query).await?)?;

        // Case-insensitive equality, matching the in-memory store
        Ok(accounts
            .into_iter()
            .filter(|account| {
                account
                    .as_doctor()
                    .is_some_and(|doctor| doctor.specialty.eq_ignore_ascii_case(specialty))
            })
            .collect())
    }

    async fn find_active_nurses_by_department(&self, department: &str) -> Result<Vec<Account>, StoreError> {
        let query = format!(
            "role=eq.nurse&active=is.true&department=ilike.{}&order=name.asc",
            encode(&escape_pattern(department))
        );
        let accounts = into_accounts(self.supabase.select(ACCOUNTS_PATH, &query).await?)?;

        Ok(accounts
            .into_iter()
            .filter(|account| {
                account
                    .as_nurse()
                    .and_then(|nurse| nurse.department.as_deref())
                    .is_some_and(|value| value.eq_ignore_ascii_case(department))
            })
            .collect())
    }
}

// ==============================================================================
// CONSULTATIONS
// ==============================================================================

pub struct SupabaseConsultationStore {
    supabase: SupabaseClient,
}

impl SupabaseConsultationStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn list(&self, filter: &str, order: &str) -> Result<Vec<Consultation>, StoreError> {
        let query = if filter.is_empty() {
            format!("order=scheduled_at.{}", order)
        } else {
            format!("{}&order=scheduled_at.{}", filter, order)
        };
        self.supabase.select(CONSULTATIONS_PATH, &query).await
    }

    async fn count_matching(&self, filter: &str) -> Result<u64, StoreError> {
        let query = if filter.is_empty() {
            "select=id".to_string()
        } else {
            format!("select=id&{}", filter)
        };
        self.supabase.count(CONSULTATIONS_PATH, &query).await
    }
}

#[async_trait]
impl ConsultationStore for SupabaseConsultationStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Consultation>, StoreError> {
        let rows: Vec<Consultation> = self
            .supabase
            .select(CONSULTATIONS_PATH, &format!("id=eq.{}&limit=1", id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn save(&self, consultation: Consultation) -> Result<Consultation, StoreError> {
        let saved = self.supabase.upsert(CONSULTATIONS_PATH, &consultation).await?;
        saved.into_iter().next().ok_or_else(|| {
            StoreError::Backend(format!("consultation {} was not returned after save", consultation.id))
        })
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.supabase.delete(CONSULTATIONS_PATH, &format!("id=eq.{}", id)).await?;
        Ok(!removed.is_empty())
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.count_matching(&format!("id=eq.{}", id)).await? > 0)
    }

    async fn find_all(&self) -> Result<Vec<Consultation>, StoreError> {
        self.list("", "desc").await
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Consultation>, StoreError> {
        self.list(&format!("patient_id=eq.{}", patient_id), "desc").await
    }

    async fn find_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<Consultation>, StoreError> {
        self.list(&format!("doctor_id=eq.{}", doctor_id), "desc").await
    }

    async fn find_by_doctors(&self, doctor_ids: &[Uuid]) -> Result<Vec<Consultation>, StoreError> {
        if doctor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = doctor_ids.iter().map(Uuid::to_string).collect();
        self.list(&format!("doctor_id=in.({})", ids.join(",")), "desc").await
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, StoreError> {
        let filter = format!(
            "scheduled_at=gte.{}&scheduled_at=lte.{}",
            encode_time(start),
            encode_time(end)
        );
        self.list(&filter, "desc").await
    }

    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Consultation>, StoreError> {
        self.list(&format!("scheduled_at=gte.{}", encode_time(since)), "desc").await
    }

    async fn find_by_patient_after(
        &self,
        patient_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<Consultation>, StoreError> {
        let filter = format!("patient_id=eq.{}&scheduled_at=gt.{}", patient_id, encode_time(after));
        self.list(&filter, "asc").await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.count_matching("").await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.count_matching(&format!("scheduled_at=gte.{}", encode_time(since))).await
    }
}
