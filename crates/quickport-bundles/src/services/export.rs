//! Export worker: trigger event to stored bundle

use std::sync::Arc;

use tracing::{debug, error, info};

use super::poller::JobPoller;
use super::resolver::{Resolution, ResourceResolver};
use crate::config::ExportConfig;
use crate::errors::MigrationError;
use crate::events::TriggerEvent;
use crate::models::{
    bundle_key, s3_uri, ExportJobRequest, ExportOutcome, JobId, JobKind, JobRef,
};
use crate::providers::{AssetBundleApi, BundleDownloader, ObjectStore};

/// Runs one export per trigger event.
///
/// Resolve the event, start an export job, wait for it, then copy the
/// bundle from the job's download URL into the target bucket under
/// `<prefix><job-id>.qs`.
pub struct ExportService {
    api: Arc<dyn AssetBundleApi>,
    store: Arc<dyn ObjectStore>,
    downloader: Arc<dyn BundleDownloader>,
    resolver: ResourceResolver,
    poller: JobPoller,
    config: ExportConfig,
}

impl ExportService {
    pub fn new(
        api: Arc<dyn AssetBundleApi>,
        store: Arc<dyn ObjectStore>,
        downloader: Arc<dyn BundleDownloader>,
        config: ExportConfig,
    ) -> Self {
        let resolver = ResourceResolver::new(
            api.clone(),
            config.partition.clone(),
            config.region.clone(),
            config.allowed_folder_ids.clone(),
        );
        let poller = JobPoller::new(api.clone());

        Self {
            api,
            store,
            downloader,
            resolver,
            poller,
            config,
        }
    }

    pub async fn export(&self, event: &TriggerEvent) -> Result<ExportOutcome, MigrationError> {
        let (folder_id, resources) = match self.resolver.resolve(event).await? {
            Resolution::Skipped { reason, folder_id } => {
                return Ok(ExportOutcome::Skipped { reason, folder_id });
            }
            Resolution::Resources {
                folder_id,
                resources,
            } => (folder_id, resources),
        };

        let job_id = JobId::generate(JobKind::Export);
        let resource_count = resources.len();
        let request = ExportJobRequest {
            account_id: event.account.clone(),
            job_id: job_id.clone(),
            resource_arns: resources.into_vec(),
        };

        let started = self.api.start_export_job(&request).await?;
        info!(
            "Started export job {} in account {} for {} resources",
            started.job_id, event.account, resource_count
        );

        let job = JobRef::new(JobKind::Export, event.account.clone(), job_id.clone());
        let description = self.poller.poll(&job, &self.config.poll).await?;
        if !description.status.is_successful() {
            error!(
                "Export job {} ended with status={} ({} errors)",
                job_id,
                description.status,
                description.errors.len()
            );
            return Err(MigrationError::ExportFailed {
                description: Box::new(description),
            });
        }

        // Re-describe for the download URL
        let download_url = self
            .api
            .describe_job(&job)
            .await?
            .download_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| MigrationError::MissingArtifact {
                job_id: job_id.to_string(),
            })?;

        let bundle = self.downloader.download(&download_url).await.map_err(|e| {
            error!("Download of bundle for export job {} failed: {}", job_id, e);
            match e {
                MigrationError::Download(message) => {
                    MigrationError::Download(format!("export job {}: {}", job_id, message))
                }
                other => other,
            }
        })?;

        let key = bundle_key(&self.config.target_prefix, &job_id);
        debug!(
            "Writing {} byte bundle to {}",
            bundle.len(),
            s3_uri(&self.config.target_bucket, &key)
        );
        self.store
            .put_object(
                &self.config.target_bucket,
                &key,
                bundle,
                self.config.grant_bucket_owner_full_control,
            )
            .await?;

        let uri = s3_uri(&self.config.target_bucket, &key);
        info!("Export job {} stored bundle at {}", job_id, uri);

        Ok(ExportOutcome::Exported {
            export_job: job_id.to_string(),
            job_status: description.status,
            folder_id,
            resource_count,
            s3_uri: uri,
        })
    }
}
