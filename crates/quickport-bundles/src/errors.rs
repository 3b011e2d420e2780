//! Error types for the bundle migration workers

use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{JobDescription, JobKind, JobStatus};

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    #[error("Could not determine resources from event: {0}")]
    Resolution(String),

    #[error("{kind} job {job_id} timed out with status={last_status}")]
    JobTimeout {
        kind: JobKind,
        job_id: String,
        last_status: JobStatus,
    },

    #[error("Export job {} failed with status={}", .description.job_id, .description.status)]
    ExportFailed { description: Box<JobDescription> },

    #[error("Import job {} failed with status={}", .description.job_id, .description.status)]
    ImportFailed { description: Box<JobDescription> },

    #[error("No DownloadUrl on successful export job {job_id}")]
    MissingArtifact { job_id: String },

    #[error("Failed to download bundle: {0}")]
    Download(String),

    #[error("QuickSight error: {0}")]
    QuickSight(String),

    #[error("Storage error for s3://{bucket}/{key}: {message}")]
    Storage {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrationError {
    /// Structured body reported to the invoking scheduler on failure.
    ///
    /// Failed import jobs surface the vendor's error, rollback-error and
    /// warning lists verbatim; everything else reports the message.
    pub fn failure_body(&self) -> Value {
        match self {
            MigrationError::ImportFailed { description } => json!({
                "status": description.status,
                "import_job": description.job_id,
                "errors": description.errors,
                "rollbackErrors": description.rollback_errors,
                "warnings": description.warnings,
            }),
            MigrationError::ExportFailed { description } => json!({
                "status": description.status,
                "export_job": description.job_id,
                "error": self.to_string(),
                "errors": description.errors,
                "warnings": description.warnings,
            }),
            MigrationError::JobTimeout {
                job_id,
                last_status,
                ..
            } => json!({
                "status": "FAILED",
                "error": self.to_string(),
                "job_id": job_id,
                "job_status": last_status,
            }),
            _ => json!({
                "status": "FAILED",
                "error": self.to_string(),
            }),
        }
    }
}
