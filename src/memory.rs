//! In-memory stores backing `AppState::fake()`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    auth::tokens::{generate_key, TokenStore},
    catalog::{
        repo::CatalogStore,
        repo_types::{Attribute, AttributeKind},
    },
    recipes::{
        repo::RecipeStore,
        repo_types::{ImageSwap, NewRecipe, Recipe, RecipeChanges},
    },
    storage::StorageClient,
    users::{
        repo::{UserStore, UserStoreError},
        repo_types::{NewUser, User, UserChanges},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub async fn set_active(&self, id: i64, active: bool) {
        if let Some(user) = self.rows.lock().await.iter_mut().find(|u| u.id == id) {
            user.is_active = active;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().await.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, UserStoreError> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|u| u.email == new.email) {
            return Err(UserStoreError::EmailTaken);
        }
        let user = User {
            id: rows.len() as i64 + 1,
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            is_active: true,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, UserStoreError> {
        let mut rows = self.rows.lock().await;
        if let Some(email) = &changes.email {
            if rows.iter().any(|u| u.id != id && &u.email == email) {
                return Err(UserStoreError::EmailTaken);
            }
        }
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    by_user: Mutex<HashMap<i64, String>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_or_create(&self, user_id: i64) -> anyhow::Result<String> {
        let mut by_user = self.by_user.lock().await;
        Ok(by_user.entry(user_id).or_insert_with(generate_key).clone())
    }

    async fn resolve(&self, key: &str) -> anyhow::Result<Option<i64>> {
        let by_user = self.by_user.lock().await;
        Ok(by_user.iter().find(|(_, k)| k.as_str() == key).map(|(id, _)| *id))
    }
}

#[derive(Default)]
pub struct MemoryCatalogStore {
    tags: Mutex<Vec<Attribute>>,
    ingredients: Mutex<Vec<Attribute>>,
}

impl MemoryCatalogStore {
    fn rows(&self, kind: AttributeKind) -> &Mutex<Vec<Attribute>> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_for_user(&self, kind: AttributeKind, user_id: i64) -> anyhow::Result<Vec<Attribute>> {
        let mut rows: Vec<Attribute> = self
            .rows(kind)
            .lock()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn create(&self, kind: AttributeKind, user_id: i64, name: &str) -> anyhow::Result<Attribute> {
        let mut rows = self.rows(kind).lock().await;
        let row = Attribute {
            id: rows.len() as i64 + 1,
            name: name.to_string(),
            user_id,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_many(&self, kind: AttributeKind, ids: &[i64]) -> anyhow::Result<Vec<Attribute>> {
        let mut rows: Vec<Attribute> = self
            .rows(kind)
            .lock()
            .await
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    rows: Mutex<Vec<Recipe>>,
}

fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn list_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Recipe>> {
        let mut rows: Vec<Recipe> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn get_for_user(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Recipe>> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|r| r.id == id && r.user_id == user_id).cloned())
    }

    async fn create(&self, user_id: i64, new: NewRecipe) -> anyhow::Result<Recipe> {
        let mut rows = self.rows.lock().await;
        let recipe = Recipe {
            id: rows.len() as i64 + 1,
            user_id,
            title: new.title,
            price: new.price,
            time_minutes: new.time_minutes,
            link: new.link,
            image: None,
            tag_ids: sorted(new.tag_ids),
            ingredient_ids: sorted(new.ingredient_ids),
        };
        rows.push(recipe.clone());
        Ok(recipe)
    }

    async fn update(&self, user_id: i64, id: i64, changes: RecipeChanges) -> anyhow::Result<Option<Recipe>> {
        let mut rows = self.rows.lock().await;
        let Some(recipe) = rows.iter_mut().find(|r| r.id == id && r.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            recipe.title = title;
        }
        if let Some(price) = changes.price {
            recipe.price = price;
        }
        if let Some(minutes) = changes.time_minutes {
            recipe.time_minutes = minutes;
        }
        if let Some(link) = changes.link {
            recipe.link = link;
        }
        if let Some(ids) = changes.tag_ids {
            recipe.tag_ids = sorted(ids);
        }
        if let Some(ids) = changes.ingredient_ids {
            recipe.ingredient_ids = sorted(ids);
        }
        Ok(Some(recipe.clone()))
    }

    async fn set_image(&self, user_id: i64, id: i64, key: &str) -> anyhow::Result<Option<ImageSwap>> {
        let mut rows = self.rows.lock().await;
        let Some(recipe) = rows.iter_mut().find(|r| r.id == id && r.user_id == user_id) else {
            return Ok(None);
        };
        let previous = recipe.image.replace(key.to_string());
        Ok(Some(ImageSwap {
            recipe: recipe.clone(),
            previous,
        }))
    }
}

/// Object store keyed like the bucket: key -> (content type, body).
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (String, Bytes)>>,
}

impl MemoryStorage {
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().await.get(key).map(|(ct, _)| ct.clone())
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (content_type.to_string(), body));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().await.remove(key);
        Ok(())
    }
}

/// Concrete handles on the stores inside a fake `AppState`.
#[derive(Clone, Default)]
pub struct MemoryStores {
    pub users: Arc<MemoryUserStore>,
    pub tokens: Arc<MemoryTokenStore>,
    pub catalog: Arc<MemoryCatalogStore>,
    pub recipes: Arc<MemoryRecipeStore>,
    pub storage: Arc<MemoryStorage>,
}
