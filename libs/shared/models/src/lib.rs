pub mod account;
pub mod auth;
pub mod consultation;
pub mod error;

pub use account::{Account, AccountCore, Doctor, Nurse, Patient, Role};
pub use consultation::{Consultation, ConsultationStats};
pub use error::AppError;
