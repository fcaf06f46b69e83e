use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;
use uuid::Uuid;

use super::token::verify_access;
use crate::error::AppError;
use crate::state::AppState;

/// Id of the authenticated caller, taken from a bearer access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers)
            .ok_or(AppError::Unauthorized("missing bearer token"))?;

        match verify_access(token, &state.config.jwt) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(e) => {
                debug!(error = %e, "rejected token");
                Err(AppError::Unauthorized("invalid or expired token"))
            }
        }
    }
}

/// The credentials of an `Authorization: Bearer ...` header; the scheme is
/// matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
