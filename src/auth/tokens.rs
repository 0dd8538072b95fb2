use async_trait::async_trait;
use rand::RngCore;
use sqlx::PgPool;

/// Length of a generated key in hex characters.
pub const TOKEN_KEY_LEN: usize = 40;

/// 20 random bytes from the OS rng, hex encoded.
pub fn generate_key() -> String {
    let mut bytes = [0u8; TOKEN_KEY_LEN / 2];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One opaque key per user. Issuing again hands back the existing key.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_or_create(&self, user_id: i64) -> anyhow::Result<String>;
    /// Owner of `key`, if any.
    async fn resolve(&self, key: &str) -> anyhow::Result<Option<i64>>;
}

#[derive(Clone)]
pub struct PgTokenStore {
    db: PgPool,
}

impl PgTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn get_or_create(&self, user_id: i64) -> anyhow::Result<String> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(generate_key())
        .bind(user_id)
        .execute(&self.db)
        .await?;

        let key: String = sqlx::query_scalar(r#"SELECT key FROM auth_tokens WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(key)
    }

    async fn resolve(&self, key: &str) -> anyhow::Result<Option<i64>> {
        let user_id = sqlx::query_scalar(r#"SELECT user_id FROM auth_tokens WHERE key = $1"#)
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(user_id)
    }
}
