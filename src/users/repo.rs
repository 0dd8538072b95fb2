use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::{NewUser, User, UserChanges};

/// Write failures. `EmailTaken` is the `users_email_key` constraint firing,
/// which can happen even after a free-email check when two writes race.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for UserStoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::EmailTaken,
            _ => Self::Other(e.into()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn create(&self, user: NewUser) -> Result<User, UserStoreError>;
    /// Returns `None` when no user has that id.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, UserStoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, UserStoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = COALESCE($2, email),
                   name = COALESCE($3, name),
                   password_hash = COALESCE($4, password_hash)
             WHERE id = $1
            RETURNING id, email, name, password_hash, is_active, is_staff, is_superuser, created_at
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
