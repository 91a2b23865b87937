use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use shared_models::account::Account;
use shared_models::error::AppError;

/// Turns a bearer token into the calling account.
#[async_trait]
pub trait CallerResolver: Send + Sync {
    async fn resolve_caller(&self, token: &str) -> Result<Account, AppError>;
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

// Resolves the caller once per request and stores it in the request extensions
pub async fn auth_middleware(
    State(resolver): State<Arc<dyn CallerResolver>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.to_string();

    let caller = resolver.resolve_caller(&token).await?;

    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
