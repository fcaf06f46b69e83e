use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::{debug, info, instrument};

use crate::config::StorageConfig;

/// Meal photos never change once written; a new capture gets a new key.
const PHOTO_CACHE_CONTROL: &str = "private, max-age=31536000, immutable";

/// Object storage for meal photos. Keys are opaque to callers and end up as
/// the meal record's image reference.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

/// S3 / MinIO backed photo store.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Connects and makes sure the photo bucket exists, creating it on a
    /// fresh MinIO.
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "nutrilog-env");
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        // path-style: MinIO does not serve virtual-host buckets by default
        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        let storage = Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        };
        storage.ensure_bucket().await?;
        Ok(storage)
    }

    async fn ensure_bucket(&self) -> anyhow::Result<()> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            debug!(bucket = %self.bucket, "photo bucket present");
            return Ok(());
        }
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("create bucket {}", self.bucket))?;
        info!(bucket = %self.bucket, "created photo bucket");
        Ok(())
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(PHOTO_CACHE_CONTROL)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("upload {key}"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("delete {key}"))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let expires = PresigningConfig::expires_in(Duration::from_secs(seconds))
            .context("presign expiry")?;
        let req = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(expires)
            .await
            .with_context(|| format!("presign {key}"))?;
        Ok(req.uri().to_string())
    }
}
