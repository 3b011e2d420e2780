//! In-memory providers for testing

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::MigrationError;
use crate::models::{
    ExportJobRequest, FolderMemberPage, ImportJobRequest, JobDescription, JobIssue, JobKind,
    JobRef, JobStatus, StartedJob,
};
use crate::providers::{AssetBundleApi, ObjectStore};

/// Scripted QuickSight API.
///
/// Each describe call pops the next scripted status for the job kind; the
/// last status repeats once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct MockAssetBundleApi {
    folders: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
    export_script: Arc<Mutex<VecDeque<JobStatus>>>,
    import_script: Arc<Mutex<VecDeque<JobStatus>>>,
    download_url: Arc<Mutex<Option<String>>>,
    import_errors: Arc<Mutex<Vec<JobIssue>>>,
    import_rollback_errors: Arc<Mutex<Vec<JobIssue>>>,

    pub started_exports: Arc<Mutex<Vec<ExportJobRequest>>>,
    pub started_imports: Arc<Mutex<Vec<ImportJobRequest>>>,
    pub list_count: Arc<AtomicUsize>,
    pub describe_count: Arc<AtomicUsize>,
}

impl MockAssetBundleApi {
    pub fn new() -> Self {
        Self::default()
            .with_export_statuses(vec![JobStatus::Successful])
            .with_import_statuses(vec![JobStatus::Successful])
            .with_download_url(Some("https://bundles.example.com/export.qs?sig=1"))
    }

    /// Folder whose listing returns `pages`, one page per call
    pub fn with_folder(self, folder_id: &str, pages: Vec<Vec<&str>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(str::to_string).collect())
            .collect();
        self.folders
            .lock()
            .unwrap()
            .insert(folder_id.to_string(), pages);
        self
    }

    pub fn with_export_statuses(self, statuses: Vec<JobStatus>) -> Self {
        *self.export_script.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_import_statuses(self, statuses: Vec<JobStatus>) -> Self {
        *self.import_script.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_download_url(self, url: Option<&str>) -> Self {
        *self.download_url.lock().unwrap() = url.map(str::to_string);
        self
    }

    pub fn with_import_errors(self, errors: Vec<JobIssue>, rollback_errors: Vec<JobIssue>) -> Self {
        *self.import_errors.lock().unwrap() = errors;
        *self.import_rollback_errors.lock().unwrap() = rollback_errors;
        self
    }

    pub fn exports(&self) -> Vec<ExportJobRequest> {
        self.started_exports.lock().unwrap().clone()
    }

    pub fn imports(&self) -> Vec<ImportJobRequest> {
        self.started_imports.lock().unwrap().clone()
    }

    pub fn describe_call_count(&self) -> usize {
        self.describe_count.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_count.load(Ordering::SeqCst)
    }

    fn next_status(script: &Mutex<VecDeque<JobStatus>>) -> JobStatus {
        let mut script = script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap_or(JobStatus::InProgress)
        } else {
            script.front().cloned().unwrap_or(JobStatus::InProgress)
        }
    }
}

#[async_trait]
impl AssetBundleApi for MockAssetBundleApi {
    async fn list_folder_members(
        &self,
        _account_id: &str,
        folder_id: &str,
        next_token: Option<String>,
    ) -> Result<FolderMemberPage, MigrationError> {
        self.list_count.fetch_add(1, Ordering::SeqCst);

        let folders = self.folders.lock().unwrap();
        let pages = folders.get(folder_id).ok_or_else(|| {
            MigrationError::QuickSight(format!("ResourceNotFoundException: folder {}", folder_id))
        })?;

        let index = match next_token {
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| MigrationError::QuickSight(format!("bad token {}", token)))?,
            None => 0,
        };

        let member_arns = pages.get(index).cloned().unwrap_or_default();
        let next_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));

        Ok(FolderMemberPage {
            member_arns,
            next_token,
        })
    }

    async fn start_export_job(
        &self,
        request: &ExportJobRequest,
    ) -> Result<StartedJob, MigrationError> {
        self.started_exports.lock().unwrap().push(request.clone());
        Ok(StartedJob {
            job_id: request.job_id.clone(),
            arn: Some(format!(
                "arn:aws:quicksight:us-east-1:{}:asset-bundle-export-job/{}",
                request.account_id, request.job_id
            )),
        })
    }

    async fn start_import_job(
        &self,
        request: &ImportJobRequest,
    ) -> Result<StartedJob, MigrationError> {
        self.started_imports.lock().unwrap().push(request.clone());
        Ok(StartedJob {
            job_id: request.job_id.clone(),
            arn: None,
        })
    }

    async fn describe_job(&self, job: &JobRef) -> Result<JobDescription, MigrationError> {
        self.describe_count.fetch_add(1, Ordering::SeqCst);

        let description = match job.kind {
            JobKind::Export => {
                let status = Self::next_status(&self.export_script);
                let mut description = JobDescription::new(job.job_id.to_string(), status);
                if description.status.is_successful() {
                    description.download_url = self.download_url.lock().unwrap().clone();
                }
                description
            }
            JobKind::Import => {
                let status = Self::next_status(&self.import_script);
                let mut description = JobDescription::new(job.job_id.to_string(), status);
                if description.status.is_terminal(JobKind::Import)
                    && !description.status.is_successful()
                {
                    description.errors = self.import_errors.lock().unwrap().clone();
                    description.rollback_errors =
                        self.import_rollback_errors.lock().unwrap().clone();
                }
                description
            }
        };

        Ok(description)
    }
}

/// A stored object and the ACL flag it was written with
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub bucket_owner_full_control: bool,
}

/// In-memory object store keyed by `(bucket, key)`
#[derive(Debug, Clone, Default)]
pub struct MockObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), StoredObject>>>,
    pub put_count: Arc<AtomicUsize>,
    pub get_count: Arc<AtomicUsize>,
    pub should_fail_get: bool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: Bytes::copy_from_slice(body),
                bucket_owner_full_control: false,
            },
        );
        self
    }

    pub fn with_get_failure(mut self) -> Self {
        self.should_fail_get = true;
        self
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn put_call_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn get_call_count(&self) -> usize {
        self.get_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        bucket_owner_full_control: bool,
    ) -> Result<(), MigrationError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                bucket_owner_full_control,
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, MigrationError> {
        self.get_count.fetch_add(1, Ordering::SeqCst);

        if self.should_fail_get {
            return Err(MigrationError::Storage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "AccessDenied".to_string(),
            });
        }

        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| MigrationError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
