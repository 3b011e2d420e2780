pub mod export;
pub mod import;
pub mod wait;

pub use export::ExportCommand;
pub use import::ImportCommand;
pub use wait::WaitCommand;

use std::io::Read;
use std::time::Duration;

use clap::Args;
use quickport_bundles::config::DEFAULT_REGION;
use quickport_bundles::{JobKind, PollSettings};

/// Connection settings shared by every command
#[derive(Args, Debug, Clone)]
pub struct AwsArgs {
    /// QuickSight region
    #[arg(long, env = "QS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Endpoint URL override (for local AWS emulators)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,
}

/// Job polling cadence and budget
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds between job status checks
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 3)]
    pub poll_interval_secs: u64,

    /// Seconds to wait for a terminal status (default: 600 export, 900 import)
    #[arg(long, env = "MAX_WAIT_SECS")]
    pub max_wait_secs: Option<u64>,
}

impl PollArgs {
    pub fn settings(&self, kind: JobKind) -> PollSettings {
        let settings = PollSettings::for_kind(kind)
            .with_interval(Duration::from_secs(self.poll_interval_secs));

        match self.max_wait_secs {
            Some(secs) => settings.with_max_wait(Duration::from_secs(secs)),
            None => settings,
        }
    }
}

/// Read a trigger payload from a file, or from stdin when `source` is `-`
pub fn read_event(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| anyhow::anyhow!("Failed to read event from stdin: {}", e))?;
        return Ok(raw);
    }

    std::fs::read_to_string(source)
        .map_err(|e| anyhow::anyhow!("Failed to read event file '{}': {}", source, e))
}

/// Print an outcome as a single JSON document on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
