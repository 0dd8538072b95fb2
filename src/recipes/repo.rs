use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{ImageSwap, NewRecipe, Recipe, RecipeChanges};
use crate::catalog::repo_types::AttributeKind;

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// The user's recipes, newest first.
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Recipe>>;
    async fn get_for_user(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Recipe>>;
    async fn create(&self, user_id: i64, recipe: NewRecipe) -> anyhow::Result<Recipe>;
    /// `None` when the recipe does not exist or belongs to someone else.
    async fn update(&self, user_id: i64, id: i64, changes: RecipeChanges) -> anyhow::Result<Option<Recipe>>;
    async fn set_image(&self, user_id: i64, id: i64, key: &str) -> anyhow::Result<Option<ImageSwap>>;
}

/// Join table and foreign-key column linking recipes to `kind`.
fn join_table(kind: AttributeKind) -> (&'static str, &'static str) {
    match kind {
        AttributeKind::Tag => ("recipe_tags", "tag_id"),
        AttributeKind::Ingredient => ("recipe_ingredients", "ingredient_id"),
    }
}

const RECIPE_COLUMNS: &str = "id, user_id, title, price, time_minutes, link, image";

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn links_for(&self, kind: AttributeKind, recipe_ids: &[i64]) -> anyhow::Result<HashMap<i64, Vec<i64>>> {
        let (table, column) = join_table(kind);
        let sql = format!(
            "SELECT recipe_id, {column} FROM {table} WHERE recipe_id = ANY($1) ORDER BY {column}"
        );
        let rows = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(recipe_ids)
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("load {table}"))?;

        let mut by_recipe: HashMap<i64, Vec<i64>> = HashMap::new();
        for (recipe_id, target_id) in rows {
            by_recipe.entry(recipe_id).or_default().push(target_id);
        }
        Ok(by_recipe)
    }

    async fn attach_relations(&self, recipes: &mut [Recipe]) -> anyhow::Result<()> {
        if recipes.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
        let mut tags = self.links_for(AttributeKind::Tag, &ids).await?;
        let mut ingredients = self.links_for(AttributeKind::Ingredient, &ids).await?;
        for recipe in recipes.iter_mut() {
            recipe.tag_ids = tags.remove(&recipe.id).unwrap_or_default();
            recipe.ingredient_ids = ingredients.remove(&recipe.id).unwrap_or_default();
        }
        Ok(())
    }
}

/// Replaces every link of `kind` on the recipe with `target_ids`.
async fn replace_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    kind: AttributeKind,
    recipe_id: i64,
    target_ids: &[i64],
) -> anyhow::Result<()> {
    let (table, column) = join_table(kind);

    sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("clear {table}"))?;

    if !target_ids.is_empty() {
        sqlx::query(&format!(
            "INSERT INTO {table} (recipe_id, {column}) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT DO NOTHING"
        ))
        .bind(recipe_id)
        .bind(target_ids)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("insert {table}"))?;
    }
    Ok(())
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Recipe>> {
        let mut recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list recipes")?;
        self.attach_relations(&mut recipes).await?;
        Ok(recipes)
    }

    async fn get_for_user(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get recipe")?;

        let Some(mut recipe) = recipe else {
            return Ok(None);
        };
        self.attach_relations(std::slice::from_mut(&mut recipe)).await?;
        Ok(Some(recipe))
    }

    async fn create(&self, user_id: i64, new: NewRecipe) -> anyhow::Result<Recipe> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let mut recipe = sqlx::query_as::<_, Recipe>(&format!(
            "INSERT INTO recipes (user_id, title, price, time_minutes, link) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&new.title)
        .bind(new.price)
        .bind(new.time_minutes)
        .bind(&new.link)
        .fetch_one(&mut *tx)
        .await
        .context("insert recipe")?;

        replace_links_tx(&mut tx, AttributeKind::Tag, recipe.id, &new.tag_ids).await?;
        replace_links_tx(&mut tx, AttributeKind::Ingredient, recipe.id, &new.ingredient_ids).await?;
        tx.commit().await.context("commit tx")?;

        recipe.tag_ids = new.tag_ids;
        recipe.ingredient_ids = new.ingredient_ids;
        recipe.tag_ids.sort_unstable();
        recipe.ingredient_ids.sort_unstable();
        Ok(recipe)
    }

    async fn update(&self, user_id: i64, id: i64, changes: RecipeChanges) -> anyhow::Result<Option<Recipe>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "UPDATE recipes \
                SET title = COALESCE($3, title), \
                    price = COALESCE($4, price), \
                    time_minutes = COALESCE($5, time_minutes), \
                    link = COALESCE($6, link) \
              WHERE id = $1 AND user_id = $2 \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(changes.title)
        .bind(changes.price)
        .bind(changes.time_minutes)
        .bind(changes.link)
        .fetch_optional(&mut *tx)
        .await
        .context("update recipe")?;

        let Some(mut recipe) = recipe else {
            return Ok(None);
        };

        if let Some(tag_ids) = &changes.tag_ids {
            replace_links_tx(&mut tx, AttributeKind::Tag, recipe.id, tag_ids).await?;
        }
        if let Some(ingredient_ids) = &changes.ingredient_ids {
            replace_links_tx(&mut tx, AttributeKind::Ingredient, recipe.id, ingredient_ids).await?;
        }
        tx.commit().await.context("commit tx")?;

        self.attach_relations(std::slice::from_mut(&mut recipe)).await?;
        Ok(Some(recipe))
    }

    async fn set_image(&self, user_id: i64, id: i64, key: &str) -> anyhow::Result<Option<ImageSwap>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let previous: Option<Option<String>> = sqlx::query_scalar(
            "SELECT image FROM recipes WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock recipe")?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let mut recipe = sqlx::query_as::<_, Recipe>(&format!(
            "UPDATE recipes SET image = $2 WHERE id = $1 RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .bind(key)
        .fetch_one(&mut *tx)
        .await
        .context("set recipe image")?;
        tx.commit().await.context("commit tx")?;

        self.attach_relations(std::slice::from_mut(&mut recipe)).await?;
        Ok(Some(ImageSwap { recipe, previous }))
    }
}
