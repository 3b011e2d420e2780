use std::sync::Arc;

use clap::Args;
use quickport_bundles::{JobId, JobKind, JobPoller, JobRef, MigrationError, QuickSightProvider};
use tracing::info;

use super::{print_json, AwsArgs, PollArgs};

/// Re-attach to a job started by an invocation that did not finish polling
#[derive(Args)]
pub struct WaitCommand {
    /// Job kind: export or import
    #[arg(long, value_parser = parse_kind)]
    kind: JobKind,

    /// Account that owns the job
    #[arg(long)]
    account: String,

    /// Job id reported when the job was started
    #[arg(long)]
    job_id: String,

    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    poll: PollArgs,
}

fn parse_kind(raw: &str) -> Result<JobKind, String> {
    raw.parse::<JobKind>().map_err(|e| e.to_string())
}

impl WaitCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let job = JobRef::new(
            self.kind,
            self.account.clone(),
            JobId::from(self.job_id.clone()),
        );
        let settings = self.poll.settings(self.kind);

        info!(
            "Waiting for {} job {} in account {}",
            job.kind, job.job_id, job.account_id
        );

        let rt = tokio::runtime::Runtime::new()?;
        let description = rt.block_on(async {
            let endpoint = self.aws.endpoint_url.as_deref();
            let api = QuickSightProvider::new(&self.aws.region, endpoint).await;
            JobPoller::new(Arc::new(api)).poll(&job, &settings).await
        })?;

        if !description.status.is_successful() {
            let description = Box::new(description);
            return Err(match job.kind {
                JobKind::Export => MigrationError::ExportFailed { description },
                JobKind::Import => MigrationError::ImportFailed { description },
            }
            .into());
        }

        print_json(&description)
    }
}
