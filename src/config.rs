use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Where uploaded recipe images end up.
#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local { root: String },
    S3(S3Config),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    /// Public base URL that image keys are appended to.
    pub media_url: String,
    pub admin: Option<AdminConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let storage = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .as_str()
        {
            "s3" => StorageConfig::S3(S3Config {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            }),
            "local" => StorageConfig::Local {
                root: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".into()),
            },
            other => anyhow::bail!("unknown STORAGE_BACKEND {other:?}, expected \"local\" or \"s3\""),
        };

        let media_url = std::env::var("MEDIA_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/media"));

        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminConfig { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            storage,
            media_url,
            admin,
        })
    }

    /// Absolute URL for a stored object key.
    pub fn media_url_for(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.media_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}
