use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::debug;

use super::{CvStore, StoreError};

/// CV files in an S3-compatible bucket.
#[derive(Clone)]
pub struct S3CvStore {
    client: S3Client,
    bucket: String,
}

impl S3CvStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl CvStore for S3CvStore {
    async fn download(&self, path: &str) -> Result<Bytes, StoreError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                StoreError::ObjectStore(format!(
                    "get s3://{}/{path} failed: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| StoreError::ObjectStore(format!("reading s3://{}/{path}: {e}", self.bucket)))?
            .into_bytes();

        debug!("Downloaded {} bytes from s3://{}/{}", bytes.len(), self.bucket, path);
        Ok(bytes)
    }
}
