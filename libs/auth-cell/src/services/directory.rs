use std::sync::Arc;

use tracing::{debug, instrument};

use security_cell::{AuthorizationPolicy, Operation};
use shared_database::AccountStore;
use shared_models::account::{Account, Role};

use crate::models::AuthError;

/// Staff-only listings of active accounts.
pub struct DirectoryService {
    accounts: Arc<dyn AccountStore>,
}

impl DirectoryService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub async fn list_doctors(&self, caller: &Account) -> Result<Vec<Account>, AuthError> {
        self.list(caller, Role::Doctor).await
    }

    pub async fn list_nurses(&self, caller: &Account) -> Result<Vec<Account>, AuthError> {
        self.list(caller, Role::Nurse).await
    }

    pub async fn list_patients(&self, caller: &Account) -> Result<Vec<Account>, AuthError> {
        self.list(caller, Role::Patient).await
    }

    /// A name filter takes precedence over the specialty filter.
    #[instrument(skip(self, caller))]
    pub async fn search_doctors(
        &self,
        caller: &Account,
        name: Option<&str>,
        specialty: Option<&str>,
    ) -> Result<Vec<Account>, AuthError> {
        AuthorizationPolicy::authorize(caller, &Operation::BrowseDirectory)?;

        let found = match (non_blank(name), non_blank(specialty)) {
            (Some(name), _) => self.accounts.search_active_by_name(Role::Doctor, name).await?,
            (None, Some(specialty)) => self.accounts.find_active_doctors_by_specialty(specialty).await?,
            (None, None) => self.accounts.find_all_active(Role::Doctor).await?,
        };

        debug!("Doctor search returned {} accounts", found.len());
        Ok(found)
    }

    #[instrument(skip(self, caller))]
    pub async fn search_nurses(
        &self,
        caller: &Account,
        name: Option<&str>,
        department: Option<&str>,
    ) -> Result<Vec<Account>, AuthError> {
        AuthorizationPolicy::authorize(caller, &Operation::BrowseDirectory)?;

        let found = match (non_blank(name), non_blank(department)) {
            (Some(name), _) => self.accounts.search_active_by_name(Role::Nurse, name).await?,
            (None, Some(department)) => self.accounts.find_active_nurses_by_department(department).await?,
            (None, None) => self.accounts.find_all_active(Role::Nurse).await?,
        };

        Ok(found)
    }

    #[instrument(skip(self, caller))]
    pub async fn search_patients(
        &self,
        caller: &Account,
        name: Option<&str>,
    ) -> Result<Vec<Account>, AuthError> {
        AuthorizationPolicy::authorize(caller, &Operation::BrowseDirectory)?;

        match non_blank(name) {
            Some(name) => Ok(self.accounts.search_active_by_name(Role::Patient, name).await?),
            None => Ok(self.accounts.find_all_active(Role::Patient).await?),
        }
    }

    async fn list(&self, caller: &Account, role: Role) -> Result<Vec<Account>, AuthError> {
        AuthorizationPolicy::authorize(caller, &Operation::BrowseDirectory)?;
        Ok(self.accounts.find_all_active(role).await?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
