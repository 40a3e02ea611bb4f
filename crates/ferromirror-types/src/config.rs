//! Configuration types for ferromirror
//!
//! Validated newtypes shared by the configuration layer, the synchronizer and
//! the scheduler. Deserialization goes through the same validation as `new`.

use std::time::Duration;

/// Read chunk size used when fingerprinting files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Minimum chunk size (4KB)
    pub const MIN: usize = 4 * 1024;
    /// Maximum chunk size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default chunk size (64KB)
    pub const DEFAULT: usize = 64 * 1024;

    /// Create a new chunk size with validation
    pub fn new(size: usize) -> Result<Self, String> {
        if size < Self::MIN {
            Err(format!("Chunk size {} is below minimum {}", size, Self::MIN))
        } else if size > Self::MAX {
            Err(format!("Chunk size {} exceeds maximum {}", size, Self::MAX))
        } else if !size.is_power_of_two() {
            Err(format!("Chunk size {} must be a power of two", size))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the chunk size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = String;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<ChunkSize> for usize {
    fn from(size: ChunkSize) -> Self {
        size.0
    }
}

/// Delay between the end of one pass and the start of the next, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
pub struct SyncInterval(u64);

impl SyncInterval {
    /// Minimum interval in seconds
    pub const MIN_SECS: u64 = 1;
    /// Default interval in seconds
    pub const DEFAULT_SECS: u64 = 60;

    /// Create a new interval with validation
    pub fn from_secs(secs: u64) -> Result<Self, String> {
        if secs < Self::MIN_SECS {
            Err(format!(
                "Sync interval must be at least {} second, got {}",
                Self::MIN_SECS,
                secs
            ))
        } else {
            Ok(Self(secs))
        }
    }

    /// Interval in whole seconds
    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// Interval as a duration
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for SyncInterval {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

impl TryFrom<u64> for SyncInterval {
    type Error = String;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl From<SyncInterval> for u64 {
    fn from(interval: SyncInterval) -> Self {
        interval.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(4096, true)]
    #[case(65536, true)]
    #[case(1024, false)]
    #[case(5000, false)]
    #[case(128 * 1024 * 1024, false)]
    fn test_chunk_size_validation(#[case] size: usize, #[case] valid: bool) {
        assert_eq!(ChunkSize::new(size).is_ok(), valid);
    }

    #[test]
    fn test_interval_validation() {
        assert!(SyncInterval::from_secs(0).is_err());
        let interval = SyncInterval::from_secs(30).unwrap();
        assert_eq!(interval.as_duration(), Duration::from_secs(30));
        assert_eq!(SyncInterval::default().as_secs(), 60);
    }
}
