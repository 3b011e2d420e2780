//! Fixed-interval polling of asset bundle jobs

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::MigrationError;
use crate::models::{JobDescription, JobKind, JobRef};
use crate::providers::AssetBundleApi;

/// Default delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polling cadence and budget for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollSettings {
    pub fn for_kind(kind: JobKind) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: kind.default_max_wait(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// Waits for asset bundle jobs to reach a terminal status
#[derive(Clone)]
pub struct JobPoller {
    api: Arc<dyn AssetBundleApi>,
}

impl JobPoller {
    pub fn new(api: Arc<dyn AssetBundleApi>) -> Self {
        Self { api }
    }

    /// Poll `job` until its status is terminal for its kind.
    ///
    /// The budget is measured from the first status check. Once it is
    /// exceeded the last observed status is reported in
    /// [`MigrationError::JobTimeout`], so the loop ends within
    /// `max_wait + interval` of the first check.
    pub async fn poll(
        &self,
        job: &JobRef,
        settings: &PollSettings,
    ) -> Result<JobDescription, MigrationError> {
        let started = Instant::now();
        let mut checks = 0u32;

        loop {
            let description = self.api.describe_job(job).await?;
            checks += 1;

            if description.status.is_terminal(job.kind) {
                info!(
                    "{} job {} reached {} after {} checks ({:?})",
                    job.kind,
                    job.job_id,
                    description.status,
                    checks,
                    started.elapsed()
                );
                return Ok(description);
            }

            if started.elapsed() > settings.max_wait {
                warn!(
                    "{} job {} still {} after {:?}, giving up",
                    job.kind, job.job_id, description.status, settings.max_wait
                );
                return Err(MigrationError::JobTimeout {
                    kind: job.kind,
                    job_id: job.job_id.to_string(),
                    last_status: description.status,
                });
            }

            debug!(
                "{} job {} status={}, checking again in {:?}",
                job.kind, job.job_id, description.status, settings.interval
            );
            sleep(settings.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobId, JobStatus};
    use crate::providers::MockAssetBundleApi;

    fn export_job() -> JobRef {
        JobRef::new(
            JobKind::Export,
            "111122223333",
            JobId::from("exp-0123456789ab".to_string()),
        )
    }

    fn import_job() -> JobRef {
        JobRef::new(
            JobKind::Import,
            "222233334444",
            JobId::from("imp-0123456789ab".to_string()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_stops_at_first_terminal_status() {
        let api = MockAssetBundleApi::new().with_export_statuses(vec![
            JobStatus::InProgress,
            JobStatus::InProgress,
            JobStatus::Successful,
        ]);
        let poller = JobPoller::new(Arc::new(api.clone()));

        let started = Instant::now();
        let description = poller
            .poll(&export_job(), &PollSettings::for_kind(JobKind::Export))
            .await
            .unwrap();

        assert_eq!(description.status, JobStatus::Successful);
        assert_eq!(description.job_id, "exp-0123456789ab");
        assert_eq!(api.describe_call_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_failed_export_as_terminal() {
        let api = MockAssetBundleApi::new()
            .with_export_statuses(vec![JobStatus::QueuedForImmediateExecution, JobStatus::Failed]);
        let poller = JobPoller::new(Arc::new(api.clone()));

        let description = poller
            .poll(&export_job(), &PollSettings::for_kind(JobKind::Export))
            .await
            .unwrap();

        assert_eq!(description.status, JobStatus::Failed);
        assert_eq!(api.describe_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_with_last_status() {
        let api = MockAssetBundleApi::new().with_import_statuses(vec![
            JobStatus::QueuedForImmediateExecution,
            JobStatus::FailedRollbackInProgress,
        ]);
        let poller = JobPoller::new(Arc::new(api.clone()));
        let settings = PollSettings::for_kind(JobKind::Import)
            .with_interval(Duration::from_secs(3))
            .with_max_wait(Duration::from_secs(10));

        let started = Instant::now();
        let error = poller.poll(&import_job(), &settings).await.unwrap_err();

        match error {
            MigrationError::JobTimeout {
                kind,
                job_id,
                last_status,
            } => {
                assert_eq!(kind, JobKind::Import);
                assert_eq!(job_id, "imp-0123456789ab");
                assert_eq!(last_status, JobStatus::FailedRollbackInProgress);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }

        // Checks at 0, 3, 6, 9 and 12 seconds; the last one is over budget
        assert_eq!(api.describe_call_count(), 5);
        assert!(started.elapsed() <= settings.max_wait + settings.interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollback_in_progress_is_not_terminal_for_imports() {
        let api = MockAssetBundleApi::new().with_import_statuses(vec![
            JobStatus::InProgress,
            JobStatus::FailedRollbackInProgress,
            JobStatus::FailedRollbackCompleted,
        ]);
        let poller = JobPoller::new(Arc::new(api.clone()));

        let description = poller
            .poll(&import_job(), &PollSettings::for_kind(JobKind::Import))
            .await
            .unwrap();

        assert_eq!(description.status, JobStatus::FailedRollbackCompleted);
        assert_eq!(api.describe_call_count(), 3);
    }

    #[test]
    fn test_default_settings() {
        let export = PollSettings::for_kind(JobKind::Export);
        assert_eq!(export.interval, Duration::from_secs(3));
        assert_eq!(export.max_wait, Duration::from_secs(600));
        assert_eq!(
            PollSettings::for_kind(JobKind::Import).max_wait,
            Duration::from_secs(900)
        );
    }
}
