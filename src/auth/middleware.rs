//! Bearer-token and role gates for protected route groups.
//!
//! `require_auth` must wrap `require_admin`: the admin gate only reads the
//! subject that the auth gate stored in the request extensions.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    auth::{claims::AuthSubject, jwt::JwtKeys},
    error::AppError,
    users::repo_types::Role,
};

/// Rejects requests without a valid `Authorization: Bearer <token>` header and
/// stores the decoded subject for downstream handlers.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized("invalid authorization header format, expected Bearer <token>")
        })?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        AppError::from(e)
    })?;

    req.extensions_mut().insert(AuthSubject::from(claims));
    Ok(next.run(req).await)
}

/// Lets through only subjects whose role is admin.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<AuthSubject>() {
        Some(subject) if subject.role == Role::Admin => Ok(next.run(req).await),
        Some(subject) => {
            warn!(user_id = subject.user_id, role = %subject.role, "admin route denied");
            Err(AppError::Forbidden("admin access required".into()))
        }
        None => Err(AppError::Forbidden("admin access required".into())),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSubject>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("authentication required"))
    }
}
