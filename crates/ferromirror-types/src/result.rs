//! Result type alias for ferromirror operations

use crate::Error;

/// Result type alias for ferromirror operations
pub type Result<T> = std::result::Result<T, Error>;
