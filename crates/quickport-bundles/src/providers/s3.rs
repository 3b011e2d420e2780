//! S3 object store for bundles and override documents

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::traits::ObjectStore;
use crate::errors::MigrationError;

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a store from the default credential and region chain
    pub async fn new(endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let config = loader.load().await;
        Self::from_client(Client::new(&config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        bucket_owner_full_control: bool,
    ) -> Result<(), MigrationError> {
        debug!("PUT s3://{}/{} ({} bytes)", bucket, key, body.len());

        let acl = bucket_owner_full_control.then_some(ObjectCannedAcl::BucketOwnerFullControl);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_acl(acl)
            .send()
            .await
            .map_err(|e| MigrationError::Storage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, MigrationError> {
        debug!("GET s3://{}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    MigrationError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    MigrationError::Storage {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        message: DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| MigrationError::Storage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(body.into_bytes())
    }
}
