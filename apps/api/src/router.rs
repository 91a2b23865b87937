use std::sync::Arc;

use axum::{routing::get, Router};

use auth_cell::{auth_routes, directory_routes, AuthState};
use consultation_cell::{consultation_routes, ConsultationState};
use notification_cell::NotificationDispatcher;
use shared_config::AppConfig;
use shared_database::{
    AccountStore, ConsultationStore, InMemoryAccountStore, InMemoryConsultationStore,
    SupabaseAccountStore, SupabaseConsultationStore,
};
use tracing::{info, warn};

pub fn create_router(config: Arc<AppConfig>, notifications: NotificationDispatcher) -> Router {
    let (accounts, consultations) = build_stores(&config);

    let auth_state = Arc::new(AuthState::new(accounts.clone(), config));
    let consultation_state = Arc::new(ConsultationState::new(consultations, accounts, notifications));

    Router::new()
        .route("/", get(|| async { "Clinic scheduler API is running!" }))
        .nest("/auth", auth_routes(auth_state.clone()))
        .nest("/directory", directory_routes(auth_state.clone()))
        .nest(
            "/consultations",
            consultation_routes(consultation_state, auth_state.caller_resolver()),
        )
}

fn build_stores(config: &AppConfig) -> (Arc<dyn AccountStore>, Arc<dyn ConsultationStore>) {
    if config.is_database_configured() {
        info!("Using Supabase stores at {}", config.supabase_url);
        (
            Arc::new(SupabaseAccountStore::new(config)),
            Arc::new(SupabaseConsultationStore::new(config)),
        )
    } else {
        warn!("SUPABASE_URL not set, using in-memory stores; data is lost on restart");
        (
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryConsultationStore::new()),
        )
    }
}
