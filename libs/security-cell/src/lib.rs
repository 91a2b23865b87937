// =====================================================================================
// SECURITY CELL - AUTHORIZATION POLICY & CREDENTIAL HASHING
// =====================================================================================
//
// Every consultation and directory operation is checked against the single
// role/ownership table in `services::policy`. Passwords are hashed with Argon2.
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{Operation, PolicyError};
pub use services::{AuthorizationPolicy, PasswordSecurityService};
