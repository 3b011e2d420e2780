//! Job, resource and outcome types shared by the export and import workers

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::MigrationError;
use crate::overrides::OverrideParameters;

/// File extension of stored asset bundles
pub const BUNDLE_EXTENSION: &str = "qs";

/// The two asset bundle job families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Export,
    Import,
}

impl JobKind {
    /// Tag prepended to generated job ids
    pub fn id_tag(&self) -> &'static str {
        match self {
            JobKind::Export => "exp",
            JobKind::Import => "imp",
        }
    }

    /// Default polling budget for a job of this kind
    pub fn default_max_wait(&self) -> Duration {
        match self {
            JobKind::Export => Duration::from_secs(600),
            JobKind::Import => Duration::from_secs(900),
        }
    }
}

impl FromStr for JobKind {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "export" | "exp" => Ok(JobKind::Export),
            "import" | "imp" => Ok(JobKind::Import),
            _ => Err(MigrationError::Configuration(format!(
                "Unknown job kind '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Export => write!(f, "Export"),
            JobKind::Import => write!(f, "Import"),
        }
    }
}

/// Job identifier of the form `<tag>-<12 hex chars>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Fresh id for a new job; never reused across invocations
    pub fn generate(kind: JobKind) -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        JobId(format!("{}-{}", kind.id_tag(), &hex[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        JobId(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to query a running job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub kind: JobKind,
    pub account_id: String,
    pub job_id: JobId,
}

impl JobRef {
    pub fn new(kind: JobKind, account_id: impl Into<String>, job_id: JobId) -> Self {
        Self {
            kind,
            account_id: account_id.into(),
            job_id,
        }
    }
}

/// Asset bundle job status as reported by QuickSight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    QueuedForImmediateExecution,
    InProgress,
    Successful,
    Failed,
    FailedRollbackInProgress,
    FailedRollbackCompleted,
    FailedRollbackError,
    /// A status this crate does not know about; never terminal
    Other(String),
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "QUEUED_FOR_IMMEDIATE_EXECUTION" => JobStatus::QueuedForImmediateExecution,
            "IN_PROGRESS" => JobStatus::InProgress,
            "SUCCESSFUL" => JobStatus::Successful,
            "FAILED" => JobStatus::Failed,
            "FAILED_ROLLBACK_IN_PROGRESS" => JobStatus::FailedRollbackInProgress,
            "FAILED_ROLLBACK_COMPLETED" => JobStatus::FailedRollbackCompleted,
            "FAILED_ROLLBACK_ERROR" => JobStatus::FailedRollbackError,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::QueuedForImmediateExecution => "QUEUED_FOR_IMMEDIATE_EXECUTION",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Successful => "SUCCESSFUL",
            JobStatus::Failed => "FAILED",
            JobStatus::FailedRollbackInProgress => "FAILED_ROLLBACK_IN_PROGRESS",
            JobStatus::FailedRollbackCompleted => "FAILED_ROLLBACK_COMPLETED",
            JobStatus::FailedRollbackError => "FAILED_ROLLBACK_ERROR",
            JobStatus::Other(s) => s,
        }
    }

    /// Whether no further transition can happen for a job of `kind`
    pub fn is_terminal(&self, kind: JobKind) -> bool {
        match kind {
            JobKind::Export => matches!(self, JobStatus::Successful | JobStatus::Failed),
            JobKind::Import => matches!(
                self,
                JobStatus::Successful
                    | JobStatus::Failed
                    | JobStatus::FailedRollbackCompleted
                    | JobStatus::FailedRollbackError
            ),
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, JobStatus::Successful)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An error or warning entry attached to a job description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Snapshot of a job returned by a describe call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDescription {
    pub job_id: String,
    pub status: JobStatus,
    /// Time-limited bundle URL; only set on successful export jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub errors: Vec<JobIssue>,
    pub rollback_errors: Vec<JobIssue>,
    pub warnings: Vec<JobIssue>,
}

impl JobDescription {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            download_url: None,
            errors: Vec::new(),
            rollback_errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Acknowledgement of a started job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedJob {
    pub job_id: JobId,
    pub arn: Option<String>,
}

/// Request for a new export job. Format and inclusion flags are fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJobRequest {
    pub account_id: String,
    pub job_id: JobId,
    pub resource_arns: Vec<String>,
}

impl ExportJobRequest {
    pub const EXPORT_FORMAT: &'static str = "QUICKSIGHT_JSON";
    pub const INCLUDE_ALL_DEPENDENCIES: bool = true;
    pub const INCLUDE_PERMISSIONS: bool = false;
    pub const INCLUDE_TAGS: bool = true;
}

/// Request for a new import job. Failed imports always roll back.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportJobRequest {
    pub account_id: String,
    pub job_id: JobId,
    pub source_uri: String,
    pub override_parameters: Option<OverrideParameters>,
}

impl ImportJobRequest {
    pub const FAILURE_ACTION: &'static str = "ROLLBACK";
}

/// One page of a folder membership listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMemberPage {
    pub member_arns: Vec<String>,
    pub next_token: Option<String>,
}

/// Non-empty list of resource ARNs handed to an export job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet(Vec<String>);

impl ResourceSet {
    /// Folder members: deduplicated and sorted for a stable job request
    pub fn from_members(arns: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut arns: Vec<String> = arns.into_iter().collect();
        arns.sort();
        arns.dedup();
        Self::verbatim(arns)
    }

    /// ARNs taken as given
    pub fn verbatim(arns: Vec<String>) -> Option<Self> {
        if arns.is_empty() {
            None
        } else {
            Some(ResourceSet(arns))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Why a trigger was accepted without starting a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FolderNotAllowed,
    FolderEmpty,
    OverrideDocument,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::FolderNotAllowed => "Folder not allowed",
            SkipReason::FolderEmpty => "Folder is empty",
            SkipReason::OverrideDocument => "Object is the override document",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result payload of an export invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum ExportOutcome {
    #[serde(rename = "OK")]
    Exported {
        export_job: String,
        job_status: JobStatus,
        #[serde(rename = "folderId")]
        folder_id: Option<String>,
        resource_count: usize,
        s3_uri: String,
    },
    #[serde(rename = "SKIPPED")]
    Skipped {
        reason: SkipReason,
        #[serde(rename = "folderId")]
        folder_id: String,
    },
}

/// Result payload of an import invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum ImportOutcome {
    #[serde(rename = "OK")]
    Imported { import_job: String, s3_uri: String },
    #[serde(rename = "SKIPPED")]
    Skipped { reason: SkipReason, s3_uri: String },
}

/// Storage key of the bundle produced by export job `job_id`
pub fn bundle_key(prefix: &str, job_id: &JobId) -> String {
    format!("{}{}.{}", prefix, job_id, BUNDLE_EXTENSION)
}

pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}
