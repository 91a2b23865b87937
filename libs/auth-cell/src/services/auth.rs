use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use security_cell::PasswordSecurityService;
use shared_config::AppConfig;
use shared_database::{AccountStore, StoreError};
use shared_models::account::Account;
use shared_models::auth::AuthPayload;
use shared_models::error::AppError;
use shared_utils::extractor::CallerResolver;
use shared_utils::jwt;

use crate::models::{normalize_email, AuthError};

/// Credential checks, token issuing and caller resolution.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, config: Arc<AppConfig>) -> Self {
        Self { accounts, config }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, AuthError> {
        let email = normalize_email(email);

        let account = match self.accounts.find_by_email(&email).await? {
            Some(account) if account.is_active() => account,
            Some(_) => {
                warn!("Login attempt for inactive account {}", email);
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                debug!("Login attempt for unknown email {}", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = PasswordSecurityService::verify_password(password, &account.core().password_hash)
            .map_err(|e| {
                warn!("Stored hash for account {} is unreadable: {}", account.id(), e);
                AuthError::InvalidCredentials
            })?;
        if !matches {
            debug!("Wrong password for account {}", account.id());
            return Err(AuthError::InvalidCredentials);
        }

        let token = jwt::issue_token(&account, &self.config.jwt_secret, self.config.token_ttl_hours)
            .map_err(AuthError::Internal)?;

        info!("{} account {} logged in", account.role(), account.id());
        Ok(AuthPayload { token, account })
    }

    /// Structure, signature and expiry only; the account is not looked up.
    pub fn validate_token(&self, token: &str) -> bool {
        match jwt::validate_token(token, &self.config.jwt_secret) {
            Ok(_) => true,
            Err(reason) => {
                debug!("Token rejected: {}", reason);
                false
            }
        }
    }

    #[instrument(skip(self, token))]
    pub async fn resolve_token(&self, token: &str) -> Result<Account, AuthError> {
        let claims = jwt::validate_token(token, &self.config.jwt_secret)
            .map_err(AuthError::Unauthenticated)?;

        match self.accounts.find_by_email(&claims.sub).await? {
            Some(account) if account.is_active() => Ok(account),
            _ => {
                warn!("Token subject {} no longer resolves to an active account", claims.sub);
                Err(AuthError::AccountNotFound)
            }
        }
    }

    /// Persists a new account with a freshly hashed password. The email must
    /// be unused, then the role's license number or tax id.
    #[instrument(skip(self, account, password), fields(role = %account.role()))]
    pub async fn register(&self, mut account: Account, password: &str) -> Result<Account, AuthError> {
        let email = normalize_email(account.email());
        account.core_mut().email = email.clone();

        if self.accounts.exists_by_email(&email).await? {
            return Err(AuthError::EmailAlreadyUsed);
        }
        if self
            .accounts
            .exists_by_natural_key(account.role(), account.natural_key())
            .await?
        {
            return Err(duplicate_key(&account));
        }

        account.core_mut().password_hash = PasswordSecurityService::hash_password(password)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?;

        let saved = match self.accounts.save(account.clone()).await {
            Ok(saved) => saved,
            // Lost a race with a concurrent registration
            Err(StoreError::Conflict(_)) => {
                return Err(if self.accounts.exists_by_email(&email).await? {
                    AuthError::EmailAlreadyUsed
                } else {
                    duplicate_key(&account)
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!("Registered {} account {}", saved.role(), saved.id());
        Ok(saved)
    }
}

fn duplicate_key(account: &Account) -> AuthError {
    let field = match account {
        Account::Patient(_) => "tax id",
        _ => "license number",
    };
    AuthError::DuplicateNaturalKey {
        field,
        value: account.natural_key().to_string(),
    }
}

#[async_trait]
impl CallerResolver for AuthService {
    async fn resolve_caller(&self, token: &str) -> Result<Account, AppError> {
        self.resolve_token(token).await.map_err(AppError::from)
    }
}
