//! Import worker: stored bundle to target account

use std::sync::Arc;

use tracing::{error, info, warn};

use super::poller::JobPoller;
use crate::config::ImportConfig;
use crate::errors::MigrationError;
use crate::events::S3EventNotification;
use crate::models::{
    s3_uri, ImportJobRequest, ImportOutcome, JobId, JobKind, JobRef, SkipReason,
};
use crate::overrides::{OverrideDocument, OverrideParameters};
use crate::providers::{AssetBundleApi, ObjectStore};

/// Runs one import per bundle notification
pub struct ImportService {
    api: Arc<dyn AssetBundleApi>,
    store: Arc<dyn ObjectStore>,
    poller: JobPoller,
    config: ImportConfig,
}

impl ImportService {
    pub fn new(
        api: Arc<dyn AssetBundleApi>,
        store: Arc<dyn ObjectStore>,
        config: ImportConfig,
    ) -> Self {
        let poller = JobPoller::new(api.clone());
        Self {
            api,
            store,
            poller,
            config,
        }
    }

    pub async fn import(
        &self,
        notification: &S3EventNotification,
    ) -> Result<ImportOutcome, MigrationError> {
        let object = notification.first_object()?;
        let source_uri = s3_uri(&object.bucket, &object.key);

        if self.config.overrides_key.as_deref() == Some(object.key.as_str()) {
            info!("{} is the override document, skipping", source_uri);
            return Ok(ImportOutcome::Skipped {
                reason: SkipReason::OverrideDocument,
                s3_uri: source_uri,
            });
        }

        let override_parameters = self.load_overrides(&object.bucket).await;

        let job_id = JobId::generate(JobKind::Import);
        let request = ImportJobRequest {
            account_id: self.config.target_account.clone(),
            job_id: job_id.clone(),
            source_uri: source_uri.clone(),
            override_parameters,
        };

        let started = self.api.start_import_job(&request).await?;
        info!(
            "Started import job {} in account {} from {}",
            started.job_id, self.config.target_account, source_uri
        );

        let job = JobRef::new(
            JobKind::Import,
            self.config.target_account.clone(),
            job_id.clone(),
        );
        let description = self.poller.poll(&job, &self.config.poll).await?;

        if !description.status.is_successful() {
            error!(
                "Import job {} ended with status={} ({} errors, {} rollback errors)",
                job_id,
                description.status,
                description.errors.len(),
                description.rollback_errors.len()
            );
            return Err(MigrationError::ImportFailed {
                description: Box::new(description),
            });
        }

        info!("Import job {} completed for {}", job_id, source_uri);
        Ok(ImportOutcome::Imported {
            import_job: job_id.to_string(),
            s3_uri: source_uri,
        })
    }

    /// Override parameters from the configured key in `bucket`.
    ///
    /// Any failure is logged and treated as "no overrides".
    async fn load_overrides(&self, bucket: &str) -> Option<OverrideParameters> {
        let key = self.config.overrides_key.as_deref()?;

        let raw = match self.store.get_object(bucket, key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not read override document, importing without overrides: {}", e);
                return None;
            }
        };

        let parameters = match OverrideDocument::from_slice(&raw) {
            Ok(document) => document.override_parameters?,
            Err(e) => {
                warn!(
                    "Override document s3://{}/{} is malformed, importing without overrides: {}",
                    bucket, key, e
                );
                return None;
            }
        };

        let unsupported = parameters.unsupported_sections();
        if !unsupported.is_empty() {
            warn!(
                "Ignoring unsupported override fields: {}",
                unsupported.join(", ")
            );
        }

        (!parameters.is_empty()).then_some(parameters)
    }
}
