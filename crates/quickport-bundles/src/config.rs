//! Worker configuration types

use std::collections::BTreeSet;
use std::time::Duration;

use crate::errors::MigrationError;
use crate::models::JobKind;
use crate::services::PollSettings;

/// Default QuickSight region
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default ARN partition
pub const DEFAULT_PARTITION: &str = "aws";
/// Default key prefix for stored bundles
pub const DEFAULT_TARGET_PREFIX: &str = "bundles/";
/// Default bundle download timeout
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration of the export worker
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// QuickSight region, also used in synthesized ARNs
    pub region: String,
    pub partition: String,
    pub target_bucket: String,
    /// Normalized key prefix (no leading slash, trailing slash)
    pub target_prefix: String,
    /// Folder ids allowed to trigger exports; empty allows every folder
    pub allowed_folder_ids: BTreeSet<String>,
    /// Write bundles with the `bucket-owner-full-control` canned ACL
    pub grant_bucket_owner_full_control: bool,
    pub download_timeout: Duration,
    pub poll: PollSettings,
}

impl ExportConfig {
    pub fn new(target_bucket: impl Into<String>) -> Result<Self, MigrationError> {
        let target_bucket = target_bucket.into();
        if target_bucket.trim().is_empty() {
            return Err(MigrationError::Configuration(
                "TARGET_BUCKET must not be empty".to_string(),
            ));
        }

        Ok(Self {
            region: DEFAULT_REGION.to_string(),
            partition: DEFAULT_PARTITION.to_string(),
            target_bucket,
            target_prefix: DEFAULT_TARGET_PREFIX.to_string(),
            allowed_folder_ids: BTreeSet::new(),
            grant_bucket_owner_full_control: false,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            poll: PollSettings::for_kind(JobKind::Export),
        })
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    pub fn with_target_prefix(mut self, prefix: &str) -> Self {
        self.target_prefix = normalize_prefix(prefix);
        self
    }

    pub fn with_allowed_folder_ids(mut self, raw: &str) -> Self {
        self.allowed_folder_ids = parse_folder_allow_list(raw);
        self
    }

    pub fn with_bucket_owner_full_control(mut self, enabled: bool) -> Self {
        self.grant_bucket_owner_full_control = enabled;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }
}

/// Configuration of the import worker
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub region: String,
    /// Account that receives the imported assets
    pub target_account: String,
    /// Key of the override document, read from the bundle's bucket
    pub overrides_key: Option<String>,
    pub poll: PollSettings,
}

impl ImportConfig {
    pub fn new(target_account: impl Into<String>) -> Result<Self, MigrationError> {
        let target_account = target_account.into();
        if target_account.trim().is_empty() {
            return Err(MigrationError::Configuration(
                "TARGET_ACCOUNT must not be empty".to_string(),
            ));
        }

        Ok(Self {
            region: DEFAULT_REGION.to_string(),
            target_account,
            overrides_key: None,
            poll: PollSettings::for_kind(JobKind::Import),
        })
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_overrides_key(mut self, key: Option<String>) -> Self {
        self.overrides_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }
}

/// Normalize a key prefix: strip leading slashes, ensure a trailing one.
/// An empty prefix falls back to the default.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_TARGET_PREFIX.to_string();
    }
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Parse a comma separated folder allow-list, dropping blank entries
pub fn parse_folder_allow_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
