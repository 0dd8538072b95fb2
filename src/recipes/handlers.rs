use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{dto::RecipeBody, dto::RecipeRequest, services};
use crate::{
    auth::extractors::AuthUser,
    error::{method_not_allowed, AppError, AppJson},
    images::services::ImageUpload,
    state::AppState,
};

/// Upper bound on an upload request body.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recipe/recipes",
            get(list_recipes).post(create_recipe).fallback(method_not_allowed),
        )
        .route(
            "/recipe/recipes/:id",
            get(get_recipe)
                .put(put_recipe)
                .patch(patch_recipe)
                .fallback(method_not_allowed),
        )
        .route(
            "/recipe/recipes/:id/upload-image",
            post(upload_image)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

/// Non-numeric ids can never match a row.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

#[instrument(skip_all)]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeBody>>, AppError> {
    Ok(Json(services::list(&state, &user).await?))
}

#[instrument(skip(state, user))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RecipeBody>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(services::get(&state, &user, id).await?))
}

#[instrument(skip_all)]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeBody>), AppError> {
    let body = services::create(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state, user, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<RecipeBody>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(services::update(&state, &user, id, payload, false).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<RecipeBody>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(services::update(&state, &user, id, payload, true).await?))
}

/// POST /recipe/recipes/:id/upload-image (multipart, field `image`)
#[instrument(skip(state, user, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RecipeBody>, AppError> {
    let id = parse_id(&id)?;
    let mut mp = multipart.map_err(|e| AppError::field("image", e.body_text()))?;

    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::field("image", e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::field("image", e.body_text()))?;
        upload = Some(ImageUpload { file_name, body });
        break;
    }

    Ok(Json(services::upload_image(&state, &user, id, upload).await?))
}
