//! Core data types for ferromirror
//!
//! This module provides the events a synchronization pass emits, the counters
//! derived from them, and the report handed back to the caller.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Transfer rate in bytes per second
pub type TransferRate = f64;

/// Filesystem operation performed on a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    /// Listing a directory
    ReadDirectory,
    /// Reading entry metadata
    Inspect,
    /// Hashing file content
    Fingerprint,
    /// Creating a directory
    CreateDirectory,
    /// Copying a file
    CopyFile,
    /// Removing a file
    RemoveFile,
    /// Removing a directory
    RemoveDirectory,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadDirectory => "read directory",
            Self::Inspect => "inspect",
            Self::Fingerprint => "fingerprint",
            Self::CreateDirectory => "create directory",
            Self::CopyFile => "copy file",
            Self::RemoveFile => "remove file",
            Self::RemoveDirectory => "remove directory",
        };
        f.write_str(name)
    }
}

/// A single action taken (or attempted) during a synchronization pass
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SyncEvent {
    /// A directory was created in the replica
    DirectoryCreated {
        /// Replica path of the new directory
        path: PathBuf,
    },
    /// A source file was copied over its replica counterpart
    FileCopied {
        /// Source file
        source: PathBuf,
        /// Replica file
        destination: PathBuf,
        /// Number of bytes copied
        bytes: u64,
    },
    /// A file was removed from the replica
    FileRemoved {
        /// Replica path of the removed file
        path: PathBuf,
    },
    /// A directory was removed from the replica
    DirectoryRemoved {
        /// Replica path of the removed directory
        path: PathBuf,
    },
    /// An operation on one entry failed; the pass continued without it
    EntryFailed {
        /// Operation that failed
        operation: Operation,
        /// Path of the entry
        path: PathBuf,
        /// Error message
        message: String,
    },
}

impl SyncEvent {
    /// The path this event is about (the replica side for copies)
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryCreated { path }
            | Self::FileRemoved { path }
            | Self::DirectoryRemoved { path }
            | Self::EntryFailed { path, .. } => path,
            Self::FileCopied { destination, .. } => destination,
        }
    }

    /// Whether this event records a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::EntryFailed { .. })
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryCreated { path } => {
                write!(f, "Created directory: {}", path.display())
            }
            Self::FileCopied {
                source,
                destination,
                ..
            } => write!(
                f,
                "Copied: {} to {}",
                source.display(),
                destination.display()
            ),
            Self::FileRemoved { path } => write!(f, "Removed: {}", path.display()),
            Self::DirectoryRemoved { path } => {
                write!(f, "Removed directory: {}", path.display())
            }
            Self::EntryFailed {
                operation,
                path,
                message,
            } => write!(
                f,
                "Failed to {} '{}': {}",
                operation,
                path.display(),
                message
            ),
        }
    }
}

/// Counters for one synchronization pass
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStats {
    /// Number of directories created
    pub directories_created: u64,
    /// Number of files copied
    pub files_copied: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Number of files left alone because their content matched
    pub files_unchanged: u64,
    /// Number of files removed
    pub files_removed: u64,
    /// Number of directories removed
    pub directories_removed: u64,
    /// Number of entry errors encountered
    pub errors: u64,
    /// Total duration of the pass
    pub duration: Duration,
}

impl SyncStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate the overall transfer rate
    pub fn transfer_rate(&self) -> TransferRate {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes_copied as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Number of mutations applied to the replica
    pub fn changes(&self) -> u64 {
        self.directories_created
            + self.files_copied
            + self.files_removed
            + self.directories_removed
    }

    /// Merge statistics from another instance
    pub fn merge(&mut self, other: &SyncStats) {
        self.directories_created += other.directories_created;
        self.files_copied += other.files_copied;
        self.bytes_copied += other.bytes_copied;
        self.files_unchanged += other.files_unchanged;
        self.files_removed += other.files_removed;
        self.directories_removed += other.directories_removed;
        self.errors += other.errors;
        self.duration += other.duration;
    }
}

/// Ordered record of everything one pass did
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncReport {
    /// Source root of the pass
    pub source: PathBuf,
    /// Replica root of the pass
    pub replica: PathBuf,
    /// Events in the order they happened
    pub events: Vec<SyncEvent>,
    /// Counters derived from the events
    pub stats: SyncStats,
}

impl SyncReport {
    /// Create an empty report for the given roots
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source: P, replica: Q) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            events: Vec::new(),
            stats: SyncStats::new(),
        }
    }

    /// Append an event and update the counters
    pub fn record(&mut self, event: SyncEvent) {
        match &event {
            SyncEvent::DirectoryCreated { .. } => self.stats.directories_created += 1,
            SyncEvent::FileCopied { bytes, .. } => {
                self.stats.files_copied += 1;
                self.stats.bytes_copied += bytes;
            }
            SyncEvent::FileRemoved { .. } => self.stats.files_removed += 1,
            SyncEvent::DirectoryRemoved { .. } => self.stats.directories_removed += 1,
            SyncEvent::EntryFailed { .. } => self.stats.errors += 1,
        }
        self.events.push(event);
    }

    /// Note a file whose content already matched
    pub fn record_unchanged(&mut self) {
        self.stats.files_unchanged += 1;
    }

    /// Whether the pass changed the replica at all
    pub fn has_changes(&self) -> bool {
        self.stats.changes() > 0
    }

    /// Whether the pass finished without entry errors
    pub fn is_clean(&self) -> bool {
        self.stats.errors == 0
    }

    /// Replica-relative paths of created directories
    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.relative_paths(|e| matches!(e, SyncEvent::DirectoryCreated { .. }))
    }

    /// Replica-relative paths of copied files
    pub fn copied_files(&self) -> Vec<PathBuf> {
        self.relative_paths(|e| matches!(e, SyncEvent::FileCopied { .. }))
    }

    /// Replica-relative paths of removed files
    pub fn removed_files(&self) -> Vec<PathBuf> {
        self.relative_paths(|e| matches!(e, SyncEvent::FileRemoved { .. }))
    }

    /// Replica-relative paths of removed directories
    pub fn removed_dirs(&self) -> Vec<PathBuf> {
        self.relative_paths(|e| matches!(e, SyncEvent::DirectoryRemoved { .. }))
    }

    /// Failed entries
    pub fn failures(&self) -> impl Iterator<Item = &SyncEvent> {
        self.events.iter().filter(|e| e.is_failure())
    }

    fn relative_paths(&self, filter: impl Fn(&SyncEvent) -> bool) -> Vec<PathBuf> {
        self.events
            .iter()
            .filter(|e| filter(e))
            .map(|e| {
                let path = e.path();
                path.strip_prefix(&self.replica)
                    .or_else(|_| path.strip_prefix(&self.source))
                    .unwrap_or(path)
                    .to_path_buf()
            })
            .collect()
    }
}
