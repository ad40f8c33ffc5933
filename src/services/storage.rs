use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{info, warn};

/// Object-store operations, keyed by object name within a single bucket.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
    /// Copy-to-new-key then delete-old-key. If the copy succeeds but the
    /// delete fails, the old key is left behind and a warning is logged.
    async fn rename(&self, old_key: &str, new_key: &str) -> Result<()>;
    fn bucket(&self) -> &str;
}

pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
}

impl S3ObjectStorage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Create the bucket if it does not exist yet. Called once at startup.
    pub async fn ensure_bucket(&self) -> Result<()> {
        let head = self.client.head_bucket().bucket(&self.bucket).send().await;

        match head {
            Ok(_) => {
                info!("Bucket '{}' already exists", self.bucket);
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                self.client
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await?;
                info!("Bucket '{}' was created successfully", self.bucket);
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!(e)),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        let bytes = output.body.collect().await?.into_bytes();
        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(service_error))
                }
            }
        }
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{}", self.bucket, old_key))
            .key(new_key)
            .send()
            .await?;

        // Best effort: the copy already carries the content under the new
        // key, so a failed delete only leaves the old key behind.
        if let Err(e) = self.delete(old_key).await {
            warn!("Failed to delete old key '{}' after rename: {}", old_key, e);
        }

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
