//! ferromirror - periodic one-way directory mirroring
//!
//! Keeps a replica directory identical to a source directory by running a
//! synchronization pass at a fixed interval. Every change is logged to stdout
//! and appended to a log file.

use anyhow::{Context, Result};
use clap::Parser;
use ferromirror_config::{Config, ConfigLoader, LoggingConfig};
use ferromirror_sync::{Scheduler, Synchronizer, TracingSink};
use ferromirror_types::SyncInterval;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// ferromirror - periodic one-way directory mirroring
#[derive(Parser, Debug)]
#[command(
    name = "ferromirror",
    version = env!("CARGO_PKG_VERSION"),
    about = "Periodically mirror a source directory into a replica directory",
    long_about = "ferromirror keeps REPLICA an exact copy of SOURCE.\n\
                  Every INTERVAL seconds it copies new and changed files, creates missing\n\
                  directories and removes anything the source no longer has.\n\
                  All changes are logged to stdout and appended to LOG_FILE."
)]
struct Cli {
    /// Source directory
    source: PathBuf,

    /// Replica directory, created if missing
    replica: PathBuf,

    /// Seconds between the end of one pass and the start of the next
    #[arg(value_parser = parse_interval)]
    interval: SyncInterval,

    /// Log file, appended to
    log_file: PathBuf,
}

impl Cli {
    /// Command line arguments take precedence over file and environment settings
    fn apply(&self, config: &mut Config) {
        config.schedule.interval = self.interval;
        config.logging.log_file = Some(self.log_file.clone());
    }
}

fn parse_interval(value: &str) -> std::result::Result<SyncInterval, String> {
    let secs: u64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of seconds", value))?;
    SyncInterval::from_secs(secs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_default().context("Failed to load configuration")?;
    cli.apply(&mut config);

    // Dropping the guard flushes the file writer
    let _guard = init_logging(&config.logging)?;

    info!("ferromirror v{} starting", env!("CARGO_PKG_VERSION"));

    let synchronizer = Synchronizer::from_config(&config).with_sink(Arc::new(TracingSink));
    let scheduler = Scheduler::new(
        synchronizer,
        cli.source,
        cli.replica,
        config.schedule.interval,
    );

    tokio::select! {
        () = scheduler.run_forever() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutdown requested, stopping");
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log filter")?;

    let console_layer = logging.console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
    });

    let (file_layer, guard) = match &logging.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory '{}'", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_positional_arguments() {
        let cli = Cli::try_parse_from([
            "ferromirror",
            "/data/source",
            "/backup/replica",
            "30",
            "/var/log/ferromirror.log",
        ])
        .unwrap();

        assert_eq!(cli.source, PathBuf::from("/data/source"));
        assert_eq!(cli.replica, PathBuf::from("/backup/replica"));
        assert_eq!(cli.interval.as_secs(), 30);
        assert_eq!(cli.log_file, PathBuf::from("/var/log/ferromirror.log"));
    }

    #[rstest]
    #[case(&["ferromirror", "src", "dst", "30"])]
    #[case(&["ferromirror", "src", "dst", "0", "sync.log"])]
    #[case(&["ferromirror", "src", "dst", "soon", "sync.log"])]
    #[case(&["ferromirror", "src", "dst", "-5", "sync.log"])]
    #[case(&["ferromirror", "src", "dst", "30", "sync.log", "extra"])]
    fn test_rejects_bad_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_arguments_override_config() {
        let cli =
            Cli::try_parse_from(["ferromirror", "src", "dst", "5", "logs/mirror.log"]).unwrap();
        let mut config = Config::default();

        cli.apply(&mut config);

        assert_eq!(config.schedule.interval.as_secs(), 5);
        assert_eq!(
            config.logging.log_file,
            Some(PathBuf::from("logs/mirror.log"))
        );
    }
}
