use std::sync::Arc;

use clap::Args;
use quickport_bundles::{
    ImportConfig, ImportService, JobKind, QuickSightProvider, S3EventNotification, S3ObjectStore,
};
use tracing::info;

use super::{print_json, read_event, AwsArgs, PollArgs};

#[derive(Args)]
pub struct ImportCommand {
    /// S3 notification JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    event: String,

    /// Account that receives the imported assets
    #[arg(long, env = "TARGET_ACCOUNT")]
    target_account: String,

    /// Key of the override document in the bundle bucket
    #[arg(long, env = "OVERRIDES_S3_KEY")]
    overrides_key: Option<String>,

    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    poll: PollArgs,
}

impl ImportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let raw = read_event(&self.event)?;
        let notification = S3EventNotification::from_json(&raw)?;

        let config = ImportConfig::new(self.target_account.clone())?
            .with_region(self.aws.region.clone())
            .with_overrides_key(self.overrides_key.clone())
            .with_poll(self.poll.settings(JobKind::Import));

        info!("Import worker for account {}", config.target_account);

        let rt = tokio::runtime::Runtime::new()?;
        let outcome = rt.block_on(async {
            let endpoint = self.aws.endpoint_url.as_deref();
            let api = QuickSightProvider::new(&self.aws.region, endpoint).await;
            let store = S3ObjectStore::new(endpoint).await;

            let service = ImportService::new(Arc::new(api), Arc::new(store), config);
            service.import(&notification).await
        })?;

        print_json(&outcome)
    }
}
