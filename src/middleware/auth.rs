use axum::{extract::Request, http::header, middleware::Next, response::Response};

use crate::error::AppError;

fn extract_bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Middleware: requires an `Authorization: Bearer <token>` header on member
/// and admin record endpoints.
///
/// Format check only; the token is issued and validated by Clerk on the
/// client side. TODO: verify the session token against Clerk's JWKS once the
/// instance keys are provisioned in config.
pub async fn require_bearer(req: Request, next: Next) -> Result<Response, AppError> {
    if extract_bearer(&req).is_none() {
        return Err(AppError::AuthRequired);
    }
    Ok(next.run(req).await)
}
