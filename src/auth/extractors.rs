use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::{error::AppError, state::AppState, users::repo_types::User};

pub const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const BAD_HEADER: &str = "Invalid token header. No credentials provided.";
pub const BAD_HEADER_SPACES: &str = "Invalid token header. Token string should not contain spaces.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const INACTIVE_USER: &str = "User inactive or deleted.";

/// The authenticated caller, resolved from `Authorization: Token <key>`
/// (or `Bearer <key>`).
pub struct AuthUser(pub User);

/// Splits the header into its key. `Ok(None)` means another scheme was used.
fn parse_authorization(value: &str) -> Result<Option<&str>, AppError> {
    let mut parts = value.split_whitespace();
    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Ok(None);
    }
    let key = parts.next().ok_or(AppError::Unauthorized(BAD_HEADER))?;
    if parts.next().is_some() {
        return Err(AppError::Unauthorized(BAD_HEADER_SPACES));
    }
    Ok(Some(key))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized(NOT_PROVIDED))?;

        let key = parse_authorization(header_value)?.ok_or(AppError::Unauthorized(NOT_PROVIDED))?;

        let Some(user_id) = state.tokens.resolve(key).await? else {
            warn!("unknown token presented");
            return Err(AppError::Unauthorized(INVALID_TOKEN));
        };
        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized(INACTIVE_USER))?;

        debug!(user_id = user.id, "request authenticated");
        Ok(AuthUser(user))
    }
}
