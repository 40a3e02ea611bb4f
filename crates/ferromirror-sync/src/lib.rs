//! One-way directory mirroring for ferromirror
//!
//! This crate makes a replica directory an exact copy of a source directory:
//!
//! - **Synchronizer**: one full pass that creates, copies and prunes until the
//!   replica matches the source
//! - **Fingerprints**: chunked BLAKE3 digests for content comparison
//! - **Safe replacement**: copies land under a temporary name and are renamed
//!   into place
//! - **Event sinks**: every change and every entry failure is reported as it happens
//! - **Scheduler**: repeats passes at a fixed interval and logs failed passes
//!
//! # Examples
//!
//! ```rust
//! use ferromirror_sync::{SyncOptions, Synchronizer, TracingSink};
//! use std::sync::Arc;
//!
//! # async fn example() -> ferromirror_types::Result<()> {
//! let synchronizer = Synchronizer::new(SyncOptions::default())
//!     .with_sink(Arc::new(TracingSink));
//! let report = synchronizer.synchronize("source_dir", "replica_dir").await?;
//! println!(
//!     "{} change(s), {} byte(s) copied",
//!     report.stats.changes(),
//!     report.stats.bytes_copied
//! );
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod copy;
pub mod engine;
pub mod fingerprint;
pub mod scheduler;
pub mod sink;

pub use copy::replace_file;
pub use engine::{SyncOptions, Synchronizer};
pub use fingerprint::{fingerprint, FileFingerprint};
pub use scheduler::Scheduler;
pub use sink::{ChannelSink, NoopSink, TracingSink};
