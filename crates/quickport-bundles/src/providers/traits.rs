//! Service client traits injected into the workers

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::MigrationError;
use crate::models::{
    ExportJobRequest, FolderMemberPage, ImportJobRequest, JobDescription, JobRef, StartedJob,
};

/// QuickSight asset bundle job API
#[async_trait]
pub trait AssetBundleApi: Send + Sync {
    /// List one page of a folder's members
    async fn list_folder_members(
        &self,
        account_id: &str,
        folder_id: &str,
        next_token: Option<String>,
    ) -> Result<FolderMemberPage, MigrationError>;

    /// Start an export job
    async fn start_export_job(
        &self,
        request: &ExportJobRequest,
    ) -> Result<StartedJob, MigrationError>;

    /// Start an import job
    async fn start_import_job(
        &self,
        request: &ImportJobRequest,
    ) -> Result<StartedJob, MigrationError>;

    /// Describe a job of either kind
    async fn describe_job(&self, job: &JobRef) -> Result<JobDescription, MigrationError>;
}

/// Object storage holding bundles and override documents
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object. `bucket_owner_full_control` grants the bucket owner
    /// full control over an object written from another account.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        bucket_owner_full_control: bool,
    ) -> Result<(), MigrationError>;

    /// Read a whole object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, MigrationError>;
}

/// Fetches an exported bundle from its time-limited URL
#[async_trait]
pub trait BundleDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Bytes, MigrationError>;
}
