//! Error types and handling for ferromirror
//!
//! Errors fall into three tiers that decide how far a failure travels:
//! precondition errors stop a pass before the replica is touched, entry errors
//! are recorded against a single path while the pass carries on, and pass
//! errors end the current pass and are left to the scheduler.

use crate::Operation;
use std::fmt::Display;
use std::path::PathBuf;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - only the affected entry is skipped
    Low,
    /// Medium severity - the current pass is abandoned
    Medium,
    /// High severity - the pass is refused before any mutation
    High,
    /// Critical severity - the process cannot run at all
    Critical,
}

/// Main error type for ferromirror operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Source root does not exist
    #[error("Source path does not exist: {path}")]
    SourceNotFound {
        /// Path that was expected to be the source root
        path: PathBuf,
    },

    /// A root path exists but is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// Offending root path
        path: PathBuf,
    },

    /// Source and replica resolve to the same tree or contain one another
    #[error("Source '{source_root}' and replica '{replica_root}' overlap")]
    OverlappingRoots {
        /// Resolved source root
        source_root: PathBuf,
        /// Resolved replica root
        replica_root: PathBuf,
    },

    /// An operation on a single tree entry failed
    #[error("Failed to {operation} '{path}': {message}")]
    Entry {
        /// Operation that was being performed
        operation: Operation,
        /// Path of the entry
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// The source tree contains an entry that cannot be mirrored
    #[error("Unsupported entry '{path}': {kind}")]
    UnsupportedEntry {
        /// Path of the entry
        path: PathBuf,
        /// Description of the entry type
        kind: String,
    },

    /// I/O failure outside of any single entry
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid source or replica arguments
    Precondition,
    /// Failure confined to one entry
    Entry,
    /// Failure that ends the current pass
    Pass,
    /// Invalid configuration
    Config,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound { .. }
            | Self::NotADirectory { .. }
            | Self::OverlappingRoots { .. } => ErrorKind::Precondition,
            Self::Entry { .. } | Self::UnsupportedEntry { .. } => ErrorKind::Entry,
            Self::Io { .. } => ErrorKind::Pass,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Entry => ErrorSeverity::Low,
            ErrorKind::Pass => ErrorSeverity::Medium,
            ErrorKind::Precondition => ErrorSeverity::High,
            ErrorKind::Config => ErrorSeverity::Critical,
        }
    }

    /// Whether this error was raised before the replica could be touched
    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }

    /// Whether this error is confined to a single entry
    pub fn is_entry(&self) -> bool {
        self.kind() == ErrorKind::Entry
    }

    /// Whether this error ends the pass it occurred in
    pub fn aborts_pass(&self) -> bool {
        !self.is_entry()
    }

    /// Create a new entry error
    pub fn entry<P: Into<PathBuf>, E: Display>(operation: Operation, path: P, error: E) -> Self {
        Self::Entry {
            operation,
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// Create a new unsupported entry error
    pub fn unsupported<P: Into<PathBuf>, S: Into<String>>(path: P, kind: S) -> Self {
        Self::UnsupportedEntry {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// The operation an entry error belongs to
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Entry { operation, .. } => Some(*operation),
            Self::UnsupportedEntry { .. } => Some(Operation::Inspect),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
