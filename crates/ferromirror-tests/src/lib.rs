//! ferromirror integration testing support
//!
//! Fixtures that build source and replica trees on disk and snapshots that
//! compare them, shared by the integration tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Tree fixtures and snapshot helpers
pub mod test_utils;
