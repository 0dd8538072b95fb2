use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Attribute, AttributeKind};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The user's entries, name descending.
    async fn list_for_user(&self, kind: AttributeKind, user_id: i64) -> anyhow::Result<Vec<Attribute>>;
    async fn create(&self, kind: AttributeKind, user_id: i64, name: &str) -> anyhow::Result<Attribute>;
    /// Rows whose id is in `ids`, regardless of owner, id ascending.
    async fn find_many(&self, kind: AttributeKind, ids: &[i64]) -> anyhow::Result<Vec<Attribute>>;
}

#[derive(Clone)]
pub struct PgCatalogStore {
    db: PgPool,
}

impl PgCatalogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_for_user(&self, kind: AttributeKind, user_id: i64) -> anyhow::Result<Vec<Attribute>> {
        let sql = format!(
            "SELECT id, name, user_id FROM {} WHERE user_id = $1 ORDER BY name DESC, id DESC",
            kind.table()
        );
        let rows = sqlx::query_as::<_, Attribute>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn create(&self, kind: AttributeKind, user_id: i64, name: &str) -> anyhow::Result<Attribute> {
        let sql = format!(
            "INSERT INTO {} (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
            kind.table()
        );
        let row = sqlx::query_as::<_, Attribute>(&sql)
            .bind(name)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn find_many(&self, kind: AttributeKind, ids: &[i64]) -> anyhow::Result<Vec<Attribute>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, user_id FROM {} WHERE id = ANY($1) ORDER BY id",
            kind.table()
        );
        let rows = sqlx::query_as::<_, Attribute>(&sql)
            .bind(ids)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}
