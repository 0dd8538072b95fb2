use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, MethodRouter},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{AttributeBody, CreateAttributeRequest},
    repo_types::AttributeKind,
};
use crate::{
    auth::extractors::AuthUser,
    error::{method_not_allowed, AppError, AppJson, FieldErrors},
    state::AppState,
    validation::{self, MAX_TEXT_LEN},
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe/tags", attribute_routes(AttributeKind::Tag))
        .route("/recipe/ingredients", attribute_routes(AttributeKind::Ingredient))
}

fn attribute_routes(kind: AttributeKind) -> MethodRouter<AppState> {
    get(move |state: State<AppState>, user: AuthUser| list_attributes(state, user, kind))
        .post(
            move |state: State<AppState>, user: AuthUser, body: AppJson<CreateAttributeRequest>| {
                create_attribute(state, user, body, kind)
            },
        )
        .fallback(method_not_allowed)
}

#[instrument(skip(state, user))]
pub async fn list_attributes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    kind: AttributeKind,
) -> Result<Json<Vec<AttributeBody>>, AppError> {
    let rows = state.catalog.list_for_user(kind, user.id).await?;
    Ok(Json(rows.into_iter().map(AttributeBody::from).collect()))
}

#[instrument(skip(state, user, payload))]
pub async fn create_attribute(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateAttributeRequest>,
    kind: AttributeKind,
) -> Result<(StatusCode, Json<AttributeBody>), AppError> {
    let mut errors = FieldErrors::new();
    let name = validation::required_text(&mut errors, "name", payload.name.as_deref(), MAX_TEXT_LEN);
    let Some(name) = name else {
        return Err(AppError::Validation(errors));
    };

    let row = state.catalog.create(kind, user.id, &name).await?;
    info!(user_id = user.id, id = row.id, ?kind, "catalog entry created");
    Ok((StatusCode::CREATED, Json(row.into())))
}
