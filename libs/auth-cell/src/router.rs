use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::AccountStore;
use shared_utils::extractor::{auth_middleware, CallerResolver};

use crate::handlers;
use crate::services::{AuthService, DirectoryService, RegistrationService};

pub struct AuthState {
    pub auth: Arc<AuthService>,
    pub registration: RegistrationService,
    pub directory: DirectoryService,
}

impl AuthState {
    pub fn new(accounts: Arc<dyn AccountStore>, config: Arc<AppConfig>) -> Self {
        let auth = Arc::new(AuthService::new(accounts.clone(), config));

        Self {
            registration: RegistrationService::new(auth.clone()),
            directory: DirectoryService::new(accounts),
            auth,
        }
    }

    pub fn caller_resolver(&self) -> Arc<dyn CallerResolver> {
        self.auth.clone()
    }
}

pub fn auth_routes(state: Arc<AuthState>) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/validate", post(handlers::validate_token))
        .route("/register/doctor", post(handlers::register_doctor))
        .route("/register/nurse", post(handlers::register_nurse))
        .route("/register/patient", post(handlers::register_patient));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me))
        .layer(middleware::from_fn_with_state(state.caller_resolver(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

pub fn directory_routes(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/nurses", get(handlers::list_nurses))
        .route("/patients", get(handlers::list_patients))
        .layer(middleware::from_fn_with_state(state.caller_resolver(), auth_middleware))
        .with_state(state)
}
