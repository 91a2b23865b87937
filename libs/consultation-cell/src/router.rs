// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use notification_cell::NotificationDispatcher;
use shared_database::{AccountStore, ConsultationStore};
use shared_utils::extractor::{auth_middleware, CallerResolver};

use crate::handlers;
use crate::services::{ConsultationDetailsService, ConsultationLifecycleService, ConsultationQueryService};

pub struct ConsultationState {
    pub lifecycle: ConsultationLifecycleService,
    pub query: ConsultationQueryService,
    pub details: ConsultationDetailsService,
}

impl ConsultationState {
    pub fn new(
        consultations: Arc<dyn ConsultationStore>,
        accounts: Arc<dyn AccountStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            lifecycle: ConsultationLifecycleService::new(
                consultations.clone(),
                accounts.clone(),
                notifications,
            ),
            query: ConsultationQueryService::new(consultations, accounts.clone()),
            details: ConsultationDetailsService::new(accounts),
        }
    }
}

pub fn consultation_routes(state: Arc<ConsultationState>, resolver: Arc<dyn CallerResolver>) -> Router {
    // Every consultation operation requires an authenticated caller
    let protected_routes = Router::new()
        .route(
            "/",
            get(handlers::list_all_consultations).post(handlers::create_consultation),
        )
        .route("/mine", get(handlers::my_consultations))
        .route("/period", get(handlers::consultations_by_period))
        .route("/recent", get(handlers::recent_consultations))
        .route("/stats", get(handlers::consultation_stats))
        .route("/specialty/{specialty}", get(handlers::consultations_by_specialty))
        .route("/patients/{patient_id}", get(handlers::patient_consultations))
        .route("/patients/{patient_id}/future", get(handlers::future_patient_consultations))
        .route("/patients/{patient_id}/history", get(handlers::patient_history))
        .route("/doctors/{doctor_id}", get(handlers::doctor_consultations))
        .route(
            "/{consultation_id}",
            get(handlers::get_consultation)
                .put(handlers::update_consultation)
                .delete(handlers::delete_consultation),
        )
        .layer(middleware::from_fn_with_state(resolver, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
