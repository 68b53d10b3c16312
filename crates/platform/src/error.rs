//! Error types for sshvfs

use std::fmt;

/// Unified error type for all sshvfs operations.
///
/// Every variant carries enough context (endpoint, remote path, underlying
/// code) for a human to act on the failure without re-running with extra
/// tracing enabled.
#[derive(Debug)]
pub enum SshVfsError {
    /// Malformed remote address.
    Address(String),

    /// Missing or inconsistent configuration (user, credentials).
    Config(String),

    /// Hostname resolution failed.
    Dns {
        /// Hostname that failed to resolve.
        host: String,
        /// Underlying resolver error.
        source: std::io::Error,
    },

    /// Socket-level failure: refused, unreachable, timed out. Retryable.
    Network {
        /// Endpoint the socket was aimed at.
        endpoint: String,
        /// Underlying socket error.
        source: std::io::Error,
    },

    /// Banner or key-exchange failure during the SSH handshake.
    Handshake {
        /// Endpoint the handshake was performed against.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },

    /// Credential rejected or no authentication method available.
    /// Never retried.
    Auth {
        /// Endpoint that rejected the credential.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },

    /// Channel-open denied on a live session. Typical on servers with strict
    /// channel caps; disables command execution for the transport.
    ResourceExhausted {
        /// Endpoint that denied the channel.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },

    /// SFTP-level open/read/write/rename/unlink/stat failure.
    RemoteIo {
        /// Remote path the operation targeted.
        path: String,
        /// Description including the underlying SFTP status.
        message: String,
    },

    /// Remote command exited non-zero.
    Command {
        /// The command line that was executed.
        command: String,
        /// Exit status reported by the server.
        exit_status: u32,
    },

    /// A write in blocking mode made no progress.
    StalledWrite {
        /// Remote path being written.
        path: String,
        /// Bytes committed before the stall.
        written: u64,
        /// Total bytes the write was asked to commit.
        total: u64,
    },

    /// First failure among the concurrent uploaders of one file.
    Upload {
        /// Remote path being assembled.
        path: String,
        /// Part index of the failed chunk.
        part: usize,
        /// Description of the failure.
        message: String,
    },

    /// Operation attempted against a disconnected transport.
    NotConnected {
        /// Endpoint of the dead transport.
        endpoint: String,
    },

    /// Other I/O error.
    Io(std::io::Error),
}

impl SshVfsError {
    /// Whether a connect-phase failure of this kind may be retried.
    ///
    /// Authentication and configuration failures are permanent; transient
    /// network and handshake failures recover via the backoff schedule.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SshVfsError::Dns { .. }
                | SshVfsError::Network { .. }
                | SshVfsError::Handshake { .. }
                | SshVfsError::ResourceExhausted { .. }
                | SshVfsError::Io(_)
        )
    }
}

impl fmt::Display for SshVfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SshVfsError::Address(msg) => write!(f, "invalid remote address: {}", msg),
            SshVfsError::Config(msg) => write!(f, "configuration error: {}", msg),
            SshVfsError::Dns { host, source } => {
                write!(f, "failed to resolve hostname '{}': {}", host, source)
            }
            SshVfsError::Network { endpoint, source } => {
                write!(f, "network error connecting to {}: {}", endpoint, source)
            }
            SshVfsError::Handshake { endpoint, message } => write!(
                f,
                "SSH handshake with {} failed: {} \
                 (check that client and server share key-exchange algorithms)",
                endpoint, message
            ),
            SshVfsError::Auth { endpoint, message } => {
                write!(f, "SSH authentication to {} failed: {}", endpoint, message)
            }
            SshVfsError::ResourceExhausted { endpoint, message } => write!(
                f,
                "{} refused to open a channel: {} \
                 (the server may have reached its channel limit)",
                endpoint, message
            ),
            SshVfsError::RemoteIo { path, message } => {
                write!(f, "remote I/O error on '{}': {}", path, message)
            }
            SshVfsError::Command {
                command,
                exit_status,
            } => write!(
                f,
                "remote command exited with status {}: {}",
                exit_status, command
            ),
            SshVfsError::StalledWrite {
                path,
                written,
                total,
            } => write!(
                f,
                "SFTP write stalled at {}/{} bytes for '{}'",
                written, total, path
            ),
            SshVfsError::Upload {
                path,
                part,
                message,
            } => write!(
                f,
                "upload of part {} of '{}' failed: {}",
                part, path, message
            ),
            SshVfsError::NotConnected { endpoint } => write!(
                f,
                "not connected to {} (the connection may have been closed or timed out)",
                endpoint
            ),
            SshVfsError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SshVfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SshVfsError::Dns { source, .. } => Some(source),
            SshVfsError::Network { source, .. } => Some(source),
            SshVfsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SshVfsError {
    fn from(err: std::io::Error) -> Self {
        SshVfsError::Io(err)
    }
}

/// Result type for sshvfs operations
pub type SshVfsResult<T> = Result<T, SshVfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SshVfsError::Auth {
            endpoint: "alice@example.com:22".to_string(),
            message: "password rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "SSH authentication to alice@example.com:22 failed: password rejected"
        );
    }

    #[test]
    fn test_upload_error_identifies_part() {
        let err = SshVfsError::Upload {
            path: "/data/out.parquet".to_string(),
            part: 3,
            message: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("part 3"));
        assert!(err.to_string().contains("/data/out.parquet"));
    }

    #[test]
    fn test_retryable_classification() {
        let net = SshVfsError::Network {
            endpoint: "host:22".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(net.is_retryable());

        let auth = SshVfsError::Auth {
            endpoint: "host:22".to_string(),
            message: "rejected".to_string(),
        };
        assert!(!auth.is_retryable());

        let config = SshVfsError::Config("missing username".to_string());
        assert!(!config.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SshVfsError = io_err.into();
        assert!(matches!(err, SshVfsError::Io(_)));
    }
}
