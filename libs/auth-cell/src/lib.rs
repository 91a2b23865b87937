pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{auth_routes, directory_routes, AuthState};
pub use services::{AuthService, DirectoryService, RegistrationService};
