use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use quickport_bundles::config::{DEFAULT_PARTITION, DEFAULT_TARGET_PREFIX};
use quickport_bundles::{
    ExportConfig, ExportService, HttpBundleDownloader, JobKind, QuickSightProvider,
    S3ObjectStore, TriggerEvent,
};
use tracing::info;

use super::{print_json, read_event, AwsArgs, PollArgs};

#[derive(Args)]
pub struct ExportCommand {
    /// Trigger event JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    event: String,

    /// Bucket that receives exported bundles
    #[arg(long, env = "TARGET_BUCKET")]
    target_bucket: String,

    /// Key prefix for exported bundles
    #[arg(long, env = "TARGET_PREFIX", default_value = DEFAULT_TARGET_PREFIX)]
    target_prefix: String,

    /// Comma separated folder ids allowed to trigger exports (empty allows all)
    #[arg(long, env = "ALLOWED_FOLDER_IDS", default_value = "")]
    allowed_folder_ids: String,

    /// Write bundles with the bucket-owner-full-control canned ACL
    #[arg(long, env = "ALLOW_PUT_OBJECT_ACL")]
    allow_put_object_acl: bool,

    /// ARN partition used for synthesized resource ARNs
    #[arg(long, env = "QS_PARTITION", default_value = DEFAULT_PARTITION)]
    partition: String,

    /// Bundle download timeout in seconds
    #[arg(long, env = "DOWNLOAD_TIMEOUT_SECS", default_value_t = 60)]
    download_timeout_secs: u64,

    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    poll: PollArgs,
}

impl ExportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let raw = read_event(&self.event)?;
        let event = TriggerEvent::from_json(&raw)?;

        let config = ExportConfig::new(self.target_bucket.clone())?
            .with_region(self.aws.region.clone())
            .with_partition(self.partition.clone())
            .with_target_prefix(&self.target_prefix)
            .with_allowed_folder_ids(&self.allowed_folder_ids)
            .with_bucket_owner_full_control(self.allow_put_object_acl)
            .with_download_timeout(Duration::from_secs(self.download_timeout_secs))
            .with_poll(self.poll.settings(JobKind::Export));

        info!(
            "Export worker for account {} writing to s3://{}/{}",
            event.account, config.target_bucket, config.target_prefix
        );

        let rt = tokio::runtime::Runtime::new()?;
        let outcome = rt.block_on(async {
            let endpoint = self.aws.endpoint_url.as_deref();
            let api = QuickSightProvider::new(&self.aws.region, endpoint).await;
            let store = S3ObjectStore::new(endpoint).await;
            let downloader = HttpBundleDownloader::new(config.download_timeout)?;

            let service =
                ExportService::new(Arc::new(api), Arc::new(store), Arc::new(downloader), config);
            service.export(&event).await
        })?;

        print_json(&outcome)
    }
}
