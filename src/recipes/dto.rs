use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{price, repo_types::Recipe};
use crate::{catalog::dto::AttributeBody, config::AppConfig, validation::present};

/// Body of create, PUT and PATCH. Every field is a raw JSON value so that
/// each bad one is reported under its own name instead of failing the
/// whole parse. `None` is a missing key; `Some(Value::Null)` an explicit null.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub time_minutes: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub link: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub ingredients: Option<Value>,
}

/// List, create and update responses: relations as id lists.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
    pub time_minutes: i32,
    #[serde(serialize_with = "price::serialize")]
    pub price: Decimal,
    pub link: String,
}

/// Retrieve response: nested relations and the image URL.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<AttributeBody>,
    pub tags: Vec<AttributeBody>,
    pub time_minutes: i32,
    #[serde(serialize_with = "price::serialize")]
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct RecipeImage {
    pub id: i64,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecipeBody {
    Summary(RecipeSummary),
    Detail(RecipeDetail),
    Image(RecipeImage),
}

/// Which representation an operation answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeView {
    List,
    Detail,
    Write,
    Image,
}

/// Nested objects for the detail view; empty for the other views.
#[derive(Debug, Default)]
pub struct Related {
    pub tags: Vec<AttributeBody>,
    pub ingredients: Vec<AttributeBody>,
}

pub fn render(view: RecipeView, recipe: Recipe, related: Related, config: &AppConfig) -> RecipeBody {
    let image = recipe.image.as_deref().map(|key| config.media_url_for(key));
    match view {
        RecipeView::List | RecipeView::Write => RecipeBody::Summary(RecipeSummary {
            id: recipe.id,
            title: recipe.title,
            ingredients: recipe.ingredient_ids,
            tags: recipe.tag_ids,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
        }),
        RecipeView::Detail => RecipeBody::Detail(RecipeDetail {
            id: recipe.id,
            title: recipe.title,
            ingredients: related.ingredients,
            tags: related.tags,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image,
        }),
        RecipeView::Image => RecipeBody::Image(RecipeImage { id: recipe.id, image }),
    }
}
