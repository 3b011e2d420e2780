//! quickport-bundles: asset bundle migration between QuickSight accounts
//!
//! Exports dashboards, analyses and datasets from a source account as an
//! asset bundle, stores the bundle in S3, and imports it into a target
//! account when the object lands.
//!
//! # Pipeline
//!
//! - [`ExportService`] resolves a trigger event to resource ARNs, runs an
//!   export job and writes the bundle to `<prefix><job-id>.qs`.
//! - [`ImportService`] reacts to the S3 notification for that object, loads
//!   optional override parameters and runs an import job with rollback.
//!
//! Vendor clients are injected through the traits in [`providers`], so both
//! services run against fakes in tests.

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod overrides;
pub mod providers;
pub mod services;

pub use config::{ExportConfig, ImportConfig};
pub use errors::MigrationError;
pub use events::{S3EventNotification, TriggerEvent};
pub use models::{
    ExportOutcome, ImportOutcome, JobDescription, JobId, JobKind, JobRef, JobStatus, SkipReason,
};
pub use overrides::{OverrideDocument, OverrideParameters};
pub use providers::{
    AssetBundleApi, BundleDownloader, HttpBundleDownloader, ObjectStore, QuickSightProvider,
    S3ObjectStore,
};
pub use services::{ExportService, ImportService, JobPoller, PollSettings, ResourceResolver};
