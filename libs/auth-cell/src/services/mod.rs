pub mod auth;
pub mod directory;
pub mod registration;

pub use auth::AuthService;
pub use directory::DirectoryService;
pub use registration::RegistrationService;
