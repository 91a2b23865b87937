pub mod details;
pub mod lifecycle;
pub mod query;

pub use details::ConsultationDetailsService;
pub use lifecycle::ConsultationLifecycleService;
pub use query::ConsultationQueryService;
