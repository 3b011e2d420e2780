//! Quickport CLI - export and import workers for QuickSight asset bundles
//!
//! Each subcommand handles one invocation: it reads the trigger payload,
//! runs the matching worker and prints a JSON outcome on stdout. Failures
//! are printed as a JSON body on stderr with a non-zero exit status.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ExportCommand, ImportCommand, WaitCommand};
use quickport_bundles::MigrationError;
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "QUICKPORT_LOG_LEVEL",
        global = true
    )]
    log_level: String,

    /// Log format: compact, full, json
    #[arg(
        long,
        default_value = "compact",
        env = "QUICKPORT_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the assets named by a trigger event and store the bundle
    Export(ExportCommand),
    /// Import a stored bundle named by an S3 notification
    Import(ImportCommand),
    /// Wait for an existing export or import job to finish
    Wait(WaitCommand),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let result = match cli.command {
        Commands::Export(cmd) => cmd.execute(),
        Commands::Import(cmd) => cmd.execute(),
        Commands::Wait(cmd) => cmd.execute(),
    };

    if let Err(e) = result {
        eprintln!("{}", failure_body(&e));
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str, log_format: &str) -> anyhow::Result<()> {
    // RUST_LOG wins when set; otherwise our crates at the requested level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e))?
    } else {
        tracing_subscriber::EnvFilter::try_new(format!(
            "quickport_cli={level},\
             quickport_bundles={level},\
             aws_config=warn,\
             aws_smithy_runtime=warn,\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn",
            level = log_level
        ))
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", log_level, e))?
    };

    // Logs go to stderr; stdout carries the outcome JSON
    let fmt_layer = match log_format {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Failure body for the caller; worker errors carry their own structure
fn failure_body(error: &anyhow::Error) -> serde_json::Value {
    match error.downcast_ref::<MigrationError>() {
        Some(e) => e.failure_body(),
        None => serde_json::json!({
            "status": "FAILED",
            "error": format!("{:#}", error),
        }),
    }
}
