//! Connection configuration.

use crate::ssh::address::Endpoint;
use sshvfs_platform::Credentials;
use std::time::Duration;

/// Smallest supported SFTP pool capacity.
pub const MIN_SFTP_POOL_SIZE: usize = 1;

/// Largest supported SFTP pool capacity.
pub const MAX_SFTP_POOL_SIZE: usize = 8;

/// Tuning options shared by every transport the file system creates.
///
/// Defaults are conservative enough for cost-optimised storage boxes with
/// strict channel and session limits.
#[derive(Debug, Clone)]
pub struct SshVfsConfig {
    /// Per-operation network timeout; also bounds the connect handshake.
    pub timeout: Duration,
    /// Additional connect attempts after a retryable failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub initial_retry_delay: Duration,
    /// Interval between keepalive packets. Zero disables keepalive.
    pub keepalive_interval: Duration,
    /// Write buffer high-water mark; each sealed chunk is this large except
    /// possibly the last.
    pub chunk_size: usize,
    /// Backpressure width: how many chunk uploads may be in flight per
    /// handle.
    pub max_concurrent_uploads: usize,
    /// Restrict the key-exchange offer to non-NIST curves and contemporary
    /// DH groups.
    pub strict_crypto: bool,
    /// SFTP sessions kept per transport. Capacity 1 serialises everything
    /// and is what severely constrained servers need.
    pub sftp_pool_size: usize,
}

impl Default for SshVfsConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(1000),
            keepalive_interval: Duration::from_secs(60),
            chunk_size: 50 * 1024 * 1024,
            max_concurrent_uploads: 2,
            strict_crypto: false,
            sftp_pool_size: 1,
        }
    }
}

impl SshVfsConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-operation network timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of additional connect attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first connect retry.
    pub fn with_initial_retry_delay(mut self, delay: Duration) -> Self {
        self.initial_retry_delay = delay;
        self
    }

    /// Sets the keepalive interval. Zero disables keepalive.
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets the write chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the number of concurrent chunk uploads per handle.
    pub fn with_max_concurrent_uploads(mut self, uploads: usize) -> Self {
        self.max_concurrent_uploads = uploads.max(1);
        self
    }

    /// Restricts the algorithm offer to the non-NIST subset.
    pub fn with_strict_crypto(mut self, strict: bool) -> Self {
        self.strict_crypto = strict;
        self
    }

    /// Sets the SFTP pool capacity, clamped to the supported range.
    pub fn with_sftp_pool_size(mut self, size: usize) -> Self {
        self.sftp_pool_size = size.clamp(MIN_SFTP_POOL_SIZE, MAX_SFTP_POOL_SIZE);
        self
    }
}

/// Everything a transport needs to establish and maintain its connection.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Endpoint identity, also the registry key.
    pub endpoint: Endpoint,
    /// Credential material. The configured method is used exclusively.
    pub credentials: Credentials,
    /// Shared tuning options.
    pub config: SshVfsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SshVfsConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_retry_delay, Duration::from_millis(1000));
        assert_eq!(config.keepalive_interval, Duration::from_secs(60));
        assert_eq!(config.chunk_size, 50 * 1024 * 1024);
        assert_eq!(config.max_concurrent_uploads, 2);
        assert!(!config.strict_crypto);
        assert_eq!(config.sftp_pool_size, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = SshVfsConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5)
            .with_initial_retry_delay(Duration::from_millis(10))
            .with_keepalive_interval(Duration::from_secs(0))
            .with_chunk_size(4 * 1024 * 1024)
            .with_max_concurrent_uploads(4)
            .with_strict_crypto(true)
            .with_sftp_pool_size(2);

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_retry_delay, Duration::from_millis(10));
        assert_eq!(config.keepalive_interval, Duration::ZERO);
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
        assert_eq!(config.max_concurrent_uploads, 4);
        assert!(config.strict_crypto);
        assert_eq!(config.sftp_pool_size, 2);
    }

    #[test]
    fn test_pool_size_clamped() {
        assert_eq!(
            SshVfsConfig::new().with_sftp_pool_size(0).sftp_pool_size,
            MIN_SFTP_POOL_SIZE
        );
        assert_eq!(
            SshVfsConfig::new().with_sftp_pool_size(99).sftp_pool_size,
            MAX_SFTP_POOL_SIZE
        );
    }

    #[test]
    fn test_zero_width_uploads_rounded_up() {
        let config = SshVfsConfig::new().with_max_concurrent_uploads(0);
        assert_eq!(config.max_concurrent_uploads, 1);
    }
}
