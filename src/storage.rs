use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{S3Config, StorageConfig};

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    /// Deleting a key that does not exist is not an error.
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

/// S3 or MinIO bucket.
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

/// Files under a directory on local disk, served back at `/media`.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are relative paths; anything that could escape the root is refused.
    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(key);
        let clean = rel.components().all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !clean {
            anyhow::bail!("invalid storage key {key:?}");
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn StorageClient>> {
    let storage: Arc<dyn StorageClient> = match cfg {
        StorageConfig::Local { root } => Arc::new(LocalStorage::new(root)),
        StorageConfig::S3(s3) => Arc::new(Storage::new(s3).await?),
    };
    Ok(storage)
}
