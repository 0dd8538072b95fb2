use rust_decimal::Decimal;
use sqlx::FromRow;

/// Recipe row plus its relation ids, which are loaded from the join tables.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: String,
    /// Storage key, e.g. `uploads/recipe/<uuid>.png`.
    pub image: Option<String>,
    #[sqlx(skip)]
    pub tag_ids: Vec<i64>,
    #[sqlx(skip)]
    pub ingredient_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: String,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// `None` leaves the column or relation untouched; `Some(vec![])` clears a relation.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub time_minutes: Option<i32>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

/// Result of pointing a recipe at a new image.
#[derive(Debug, Clone)]
pub struct ImageSwap {
    pub recipe: Recipe,
    pub previous: Option<String>,
}
