use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use super::{
    dto::{render, RecipeBody, RecipeRequest, RecipeView, Related},
    price::parse_price,
    repo_types::{NewRecipe, Recipe, RecipeChanges},
};
use crate::{
    catalog::{dto::AttributeBody, repo_types::AttributeKind},
    error::{AppError, FieldErrors},
    images::services::{discard_image, inspect_image, store_recipe_image, ImageUpload, INVALID_IMAGE, NO_FILE},
    state::AppState,
    users::repo_types::User,
    validation::{self, MAX_TEXT_LEN},
};

fn invalid_pk_message(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

fn parse_time_minutes(errors: &mut FieldErrors, value: &Value) -> Option<i32> {
    let Some(minutes) = validation::parse_integer(value) else {
        errors.add("time_minutes", validation::INVALID_INTEGER);
        return None;
    };
    match i32::try_from(minutes) {
        Ok(m) => Some(m),
        Err(_) if minutes > 0 => {
            errors.add("time_minutes", format!("Ensure this value is less than or equal to {}.", i32::MAX));
            None
        }
        Err(_) => {
            errors.add("time_minutes", format!("Ensure this value is greater than or equal to {}.", i32::MIN));
            None
        }
    }
}

/// Reads a relation list. Items may be integers or integer strings.
fn parse_id_list(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<Vec<i64>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => {
            errors.add(field, validation::NULL);
            return None;
        }
        other => {
            errors.add(
                field,
                format!("Expected a list of items but got type \"{}\".", validation::type_name(other)),
            );
            return None;
        }
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(_) | Value::String(_) => match validation::parse_integer(item) {
                Some(id) => ids.push(id),
                None => {
                    errors.add(field, format!("Invalid pk \"{}\" - object does not exist.", item_text(item)));
                    return None;
                }
            },
            other => {
                errors.add(
                    field,
                    format!("Incorrect type. Expected pk value, received {}.", validation::type_name(other)),
                );
                return None;
            }
        }
    }
    Some(ids)
}

fn item_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scalars may be absent on PATCH but never explicitly null.
fn non_null<'a>(errors: &mut FieldErrors, field: &str, value: &'a Value) -> Option<&'a Value> {
    if value.is_null() {
        errors.add(field, validation::NULL);
        return None;
    }
    Some(value)
}

/// Dedupes `ids` and checks each one exists. Ownership is not checked.
async fn resolve_ids(
    state: &AppState,
    errors: &mut FieldErrors,
    kind: AttributeKind,
    ids: Vec<i64>,
) -> anyhow::Result<Option<Vec<i64>>> {
    let mut seen = HashSet::new();
    let ids: Vec<i64> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

    let found: HashSet<i64> = state
        .catalog
        .find_many(kind, &ids)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    let mut ok = true;
    for id in &ids {
        if !found.contains(id) {
            errors.add(kind.relation_field(), invalid_pk_message(*id));
            ok = false;
        }
    }
    Ok(ok.then_some(ids))
}

/// Turns a request into column changes. Outside `partial` mode the scalar
/// fields are required and omitted relations become empty.
async fn validate(state: &AppState, req: RecipeRequest, partial: bool) -> Result<RecipeChanges, AppError> {
    let mut errors = FieldErrors::new();
    let mut changes = RecipeChanges::default();

    if req.title.is_some() || !partial {
        changes.title =
            validation::required_text_value(&mut errors, "title", req.title.as_ref(), MAX_TEXT_LEN);
    }

    match (&req.price, partial) {
        (Some(value), _) => {
            if let Some(value) = non_null(&mut errors, "price", value) {
                match parse_price(value) {
                    Ok(p) => changes.price = Some(p),
                    Err(msg) => errors.add("price", msg),
                }
            }
        }
        (None, false) => errors.add("price", validation::REQUIRED),
        (None, true) => {}
    }

    match (&req.time_minutes, partial) {
        (Some(value), _) => {
            if let Some(value) = non_null(&mut errors, "time_minutes", value) {
                changes.time_minutes = parse_time_minutes(&mut errors, value);
            }
        }
        (None, false) => errors.add("time_minutes", validation::REQUIRED),
        (None, true) => {}
    }

    changes.link = validation::optional_text_value(&mut errors, "link", req.link.as_ref(), MAX_TEXT_LEN);

    for kind in [AttributeKind::Tag, AttributeKind::Ingredient] {
        let (raw, slot) = match kind {
            AttributeKind::Tag => (&req.tags, &mut changes.tag_ids),
            AttributeKind::Ingredient => (&req.ingredients, &mut changes.ingredient_ids),
        };
        *slot = match raw {
            Some(value) => match parse_id_list(&mut errors, kind.relation_field(), value) {
                Some(ids) => resolve_ids(state, &mut errors, kind, ids).await?,
                None => None,
            },
            None if !partial => Some(Vec::new()),
            None => None,
        };
    }

    if !errors.is_empty() {
        warn!(fields = ?errors, "recipe payload rejected");
    }
    errors.into_result()?;
    Ok(changes)
}

async fn related_for(state: &AppState, recipe: &Recipe) -> anyhow::Result<Related> {
    let to_bodies = |rows: Vec<crate::catalog::repo_types::Attribute>| {
        rows.into_iter().map(AttributeBody::from).collect::<Vec<_>>()
    };
    let tags = state.catalog.find_many(AttributeKind::Tag, &recipe.tag_ids).await?;
    let ingredients = state
        .catalog
        .find_many(AttributeKind::Ingredient, &recipe.ingredient_ids)
        .await?;
    Ok(Related {
        tags: to_bodies(tags),
        ingredients: to_bodies(ingredients),
    })
}

/// Picks the response shape for `view`, loading nested rows when it needs them.
pub async fn present(state: &AppState, recipe: Recipe, view: RecipeView) -> anyhow::Result<RecipeBody> {
    let related = match view {
        RecipeView::Detail => related_for(state, &recipe).await?,
        _ => Related::default(),
    };
    Ok(render(view, recipe, related, &state.config))
}

pub async fn list(state: &AppState, user: &User) -> Result<Vec<RecipeBody>, AppError> {
    let recipes = state.recipes.list_for_user(user.id).await?;
    let mut out = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        out.push(present(state, recipe, RecipeView::List).await?);
    }
    Ok(out)
}

pub async fn get(state: &AppState, user: &User, id: i64) -> Result<RecipeBody, AppError> {
    let recipe = state
        .recipes
        .get_for_user(user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(present(state, recipe, RecipeView::Detail).await?)
}

pub async fn create(state: &AppState, user: &User, req: RecipeRequest) -> Result<RecipeBody, AppError> {
    let changes = validate(state, req, false).await?;
    let (Some(title), Some(price), Some(time_minutes)) = (changes.title, changes.price, changes.time_minutes)
    else {
        return Err(anyhow::anyhow!("validated recipe is missing a required field").into());
    };

    let recipe = state
        .recipes
        .create(
            user.id,
            NewRecipe {
                title,
                price,
                time_minutes,
                link: changes.link.unwrap_or_default(),
                tag_ids: changes.tag_ids.unwrap_or_default(),
                ingredient_ids: changes.ingredient_ids.unwrap_or_default(),
            },
        )
        .await?;
    info!(user_id = user.id, recipe_id = recipe.id, "recipe created");
    Ok(present(state, recipe, RecipeView::Write).await?)
}

pub async fn update(
    state: &AppState,
    user: &User,
    id: i64,
    req: RecipeRequest,
    partial: bool,
) -> Result<RecipeBody, AppError> {
    // Ownership first, so a foreign recipe is 404 even with a bad payload.
    if state.recipes.get_for_user(user.id, id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let changes = validate(state, req, partial).await?;
    let recipe = state
        .recipes
        .update(user.id, id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = user.id, recipe_id = recipe.id, partial, "recipe updated");
    Ok(present(state, recipe, RecipeView::Write).await?)
}

pub async fn upload_image(
    state: &AppState,
    user: &User,
    id: i64,
    upload: Option<ImageUpload>,
) -> Result<RecipeBody, AppError> {
    if state.recipes.get_for_user(user.id, id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let Some(upload) = upload else {
        return Err(AppError::field("image", NO_FILE));
    };
    if upload.body.is_empty() {
        return Err(AppError::field("image", "The submitted file is empty."));
    }
    let Some(format) = inspect_image(upload.body.clone()).await? else {
        warn!(user_id = user.id, recipe_id = id, "rejected invalid image upload");
        return Err(AppError::field("image", INVALID_IMAGE));
    };

    let key = store_recipe_image(state, upload, format).await?;
    let swap = match state.recipes.set_image(user.id, id, &key).await {
        Ok(Some(swap)) => swap,
        Ok(None) => {
            discard_image(state, &key).await;
            return Err(AppError::NotFound);
        }
        Err(e) => {
            discard_image(state, &key).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = swap.previous.as_deref().filter(|p| *p != key) {
        discard_image(state, previous).await;
    }
    info!(user_id = user.id, recipe_id = id, key = %key, "recipe image stored");
    Ok(present(state, swap.recipe, RecipeView::Image).await?)
}
