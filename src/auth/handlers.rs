use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use super::dto::{TokenRequest, TokenResponse};
use crate::{
    error::{method_not_allowed, AppError, AppJson, FieldErrors},
    state::AppState,
    users::services::authenticate,
    validation,
};

pub fn token_routes() -> Router<AppState> {
    Router::new().route("/user/token", post(obtain_token).fallback(method_not_allowed))
}

fn required_credential(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        None => {
            errors.add(field, validation::REQUIRED);
            None
        }
        Some(v) if v.is_empty() => {
            errors.add(field, validation::BLANK);
            None
        }
        Some(v) => Some(v),
    }
}

/// Exchanges email and password for the user's token.
#[instrument(skip(state, payload))]
pub async fn obtain_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut errors = FieldErrors::new();
    let email = required_credential(&mut errors, "email", payload.email);
    let password = required_credential(&mut errors, "password", payload.password);
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(errors));
    };

    let user = authenticate(&state, &email, &password).await?;
    let token = state.tokens.get_or_create(user.id).await?;
    info!(user_id = user.id, "token issued");
    Ok(Json(TokenResponse { token }))
}
