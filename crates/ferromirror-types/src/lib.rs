//! Core type system and error handling for ferromirror
//!
//! This crate provides the foundational types shared by the ferromirror crates:
//!
//! - **Error handling**: precondition, entry and pass level errors
//! - **Core types**: sync events, per-pass statistics and reports
//! - **Traits**: the event sink the synchronizer reports through
//! - **Configuration**: validated chunk sizes and sync intervals
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferromirror_types::{SyncEvent, SyncReport};
//! use std::path::PathBuf;
//!
//! let mut report = SyncReport::new("source", "replica");
//! report.record(SyncEvent::FileRemoved {
//!     path: PathBuf::from("replica/stale.txt"),
//! });
//! assert_eq!(report.removed_files(), vec![PathBuf::from("stale.txt")]);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ChunkSize, SyncInterval};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_stats_creation() {
        let stats = SyncStats::new();
        assert_eq!(stats.files_copied, 0);
        assert_eq!(stats.bytes_copied, 0);
        assert_eq!(stats.transfer_rate(), 0.0);
    }

    #[test]
    fn test_error_severity() {
        let io_error = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        assert_eq!(io_error.severity(), ErrorSeverity::Medium);

        let config_error = Error::config("invalid config");
        assert_eq!(config_error.severity(), ErrorSeverity::Critical);
        assert!(config_error.aborts_pass());
    }

    #[test]
    fn test_chunk_size_default() {
        assert_eq!(ChunkSize::default().get(), 64 * 1024);
    }
}
