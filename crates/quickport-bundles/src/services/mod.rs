//! Export and import orchestration

mod export;
mod import;
mod poller;
mod resolver;

pub use export::ExportService;
pub use import::ImportService;
pub use poller::{JobPoller, PollSettings, DEFAULT_POLL_INTERVAL};
pub use resolver::{Resolution, ResourceResolver};
