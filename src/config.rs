//! Writer configuration.
//!
//! Plain data, validated once at writer construction; no config-file I/O.
//! Use [`Config::default()`] for interactive workloads or
//! [`Config::bulk_load()`] when import throughput matters more than id
//! density.

use std::time::Duration;

use crate::error::{Result, WriteError};

#[derive(Debug, Clone)]
pub struct Config {
    /// Ids fetched per remote lease. Larger leases amortize the allocation
    /// RPC further but leak more ids on shutdown.
    pub lease_size: u32,
    /// Total write queues at the ingestion point, including the reserved
    /// schema/DDL queue 0. Must exceed 1 so data traffic has somewhere to go.
    pub queue_count: u16,
    /// Store partitions for offline key partitioning.
    pub partition_count: u32,
    /// Default deadline for flush calls.
    pub flush_timeout: Duration,
    /// Client name embedded in session ids minted by the writer.
    pub writer_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lease_size: 10_000,
            queue_count: 4,
            partition_count: 16,
            flush_timeout: Duration::from_secs(30),
            writer_name: "writer".into(),
        }
    }
}

impl Config {
    /// Preset for bulk imports: wide queue fan-out and big leases.
    pub fn bulk_load() -> Self {
        Self {
            lease_size: 200_000,
            queue_count: 16,
            flush_timeout: Duration::from_secs(120),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_count <= 1 {
            return Err(WriteError::InvalidArgument(format!(
                "queue count must exceed 1, got {}",
                self.queue_count
            )));
        }
        if self.lease_size == 0 {
            return Err(WriteError::InvalidArgument(
                "lease size must be positive".into(),
            ));
        }
        if self.partition_count == 0 {
            return Err(WriteError::InvalidArgument(
                "partition count must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::bulk_load().validate().is_ok());
    }

    #[test]
    fn degenerate_values_are_rejected() {
        let mut config = Config::default();
        config.queue_count = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.lease_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.partition_count = 0;
        assert!(config.validate().is_err());
    }
}
