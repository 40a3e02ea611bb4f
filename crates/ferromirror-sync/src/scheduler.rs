//! Periodic pass scheduling
//!
//! The scheduler owns the interval and the error policy: a pass that fails is
//! logged and the next one runs on time. The synchronizer itself knows nothing
//! about either.

use crate::engine::Synchronizer;
use ferromirror_types::{SyncInterval, SyncReport};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Runs synchronization passes between a fixed pair of roots
#[derive(Debug, Clone)]
pub struct Scheduler {
    synchronizer: Synchronizer,
    source: PathBuf,
    replica: PathBuf,
    interval: SyncInterval,
}

impl Scheduler {
    /// Create a scheduler for the given roots
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        synchronizer: Synchronizer,
        source: P,
        replica: Q,
        interval: SyncInterval,
    ) -> Self {
        Self {
            synchronizer,
            source: source.into(),
            replica: replica.into(),
            interval,
        }
    }

    /// Pause between the end of one pass and the start of the next
    pub fn interval(&self) -> SyncInterval {
        self.interval
    }

    /// Source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Replica root
    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Run a single pass and log its outcome
    ///
    /// Returns `None` when the pass was aborted.
    pub async fn run_pass(&self) -> Option<SyncReport> {
        info!("Starting synchronization...");

        match self
            .synchronizer
            .synchronize(&self.source, &self.replica)
            .await
        {
            Ok(report) => {
                let stats = &report.stats;
                if report.is_clean() {
                    info!(
                        "Synchronization completed. {} change(s), {} file(s) unchanged in {:.2?}",
                        stats.changes(),
                        stats.files_unchanged,
                        stats.duration
                    );
                } else {
                    warn!(
                        "Synchronization completed with {} error(s). {} change(s) in {:.2?}",
                        stats.errors,
                        stats.changes(),
                        stats.duration
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!("Error during synchronization: {}", e);
                None
            }
        }
    }

    /// Run `count` passes, sleeping for the interval between them
    pub async fn run_passes(&self, count: usize) -> Vec<Option<SyncReport>> {
        let mut reports = Vec::with_capacity(count);
        for pass in 0..count {
            if pass > 0 {
                tokio::time::sleep(self.interval.as_duration()).await;
            }
            reports.push(self.run_pass().await);
        }
        reports
    }

    /// Run passes until the future is dropped
    pub async fn run_forever(&self) {
        info!(
            "Mirroring '{}' to '{}' every {}s",
            self.source.display(),
            self.replica.display(),
            self.interval.as_secs()
        );

        loop {
            self.run_pass().await;
            tokio::time::sleep(self.interval.as_duration()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::Instant;

    fn interval(secs: u64) -> SyncInterval {
        SyncInterval::from_secs(secs).unwrap()
    }

    #[tokio::test]
    async fn test_run_pass_returns_report() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("a.txt"), "hello").unwrap();

        let scheduler = Scheduler::new(
            Synchronizer::default(),
            &source,
            temp_dir.path().join("replica"),
            interval(1),
        );
        let report = scheduler.run_pass().await.unwrap();

        assert_eq!(report.stats.files_copied, 1);
        assert!(temp_dir.path().join("replica/a.txt").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_passes_do_not_stop_the_schedule() {
        let temp_dir = TempDir::new().unwrap();
        let scheduler = Scheduler::new(
            Synchronizer::default(),
            temp_dir.path().join("missing"),
            temp_dir.path().join("replica"),
            interval(30),
        );

        let start = Instant::now();
        let reports = scheduler.run_passes(3).await;

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(Option::is_none));
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_forever_keeps_converging() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("a.txt"), "hello").unwrap();

        let scheduler = Scheduler::new(Synchronizer::default(), &source, &replica, interval(60));
        let result = tokio::time::timeout(Duration::from_secs(150), scheduler.run_forever()).await;

        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(replica.join("a.txt")).unwrap(),
            "hello"
        );
    }
}
