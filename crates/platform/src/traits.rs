//! Core traits for the sshvfs virtual file system

use crate::SshVfsResult;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Metadata for a remote path, as reported by a stat round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteMetadata {
    /// File size in bytes, when the server reported one.
    pub size: Option<u64>,
    /// Last modification time as Unix seconds, when reported.
    pub modified_unix_secs: Option<u64>,
    /// Whether the permission bits identify a directory.
    pub is_dir: bool,
}

/// Byte-level access to files on a remote store.
///
/// The SSH transport implements this trait; the write pipeline and the read
/// path are written against it so their contracts can be exercised without a
/// live server.
#[async_trait::async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// Uploads one chunk of a file.
    ///
    /// With `append == false` the destination is opened with
    /// create-and-truncate semantics; with `append == true` the chunk is
    /// appended to the existing file. Parent directories are created as
    /// needed.
    async fn upload_chunk(&self, path: &str, data: &[u8], append: bool) -> SshVfsResult<()>;

    /// Reads up to `buf.len()` bytes starting at `offset`, returning the
    /// number of bytes read. A short read occurs only at end-of-file; zero
    /// means the offset is at or past the end.
    async fn read_bytes(&self, path: &str, offset: u64, buf: &mut [u8]) -> SshVfsResult<usize>;

    /// Stats the remote path.
    async fn stat(&self, path: &str) -> SshVfsResult<RemoteMetadata>;

    /// Sets the file size, truncating or extending in place.
    async fn truncate(&self, path: &str, size: u64) -> SshVfsResult<()>;
}

/// Credential material for one endpoint.
///
/// The configured method is used exclusively: a password never falls through
/// to a key, a key never falls through to the agent.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Login user, when the address did not carry one.
    pub username: Option<String>,
    /// Password for password authentication. Zeroized on drop.
    pub password: Option<Zeroizing<String>>,
    /// Path to a private key file for public-key authentication.
    pub key_path: Option<PathBuf>,
    /// Explicitly authenticate through the SSH agent.
    pub use_agent: bool,
}

// Manual Debug so credential material never lands in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_path", &self.key_path)
            .field("use_agent", &self.use_agent)
            .finish()
    }
}

/// Source of credentials, implemented by the embedding engine's secret layer.
pub trait CredentialProvider: Send + Sync {
    /// Looks up credentials for a host. `None` means the host is unknown to
    /// this provider; connection setup then relies on the agent probe order.
    fn lookup(&self, host: &str) -> Option<Credentials>;
}

/// Provider that knows no hosts. The default for stand-alone use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn lookup(&self, _host: &str) -> Option<Credentials> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: Some("alice".to_string()),
            password: Some(Zeroizing::new("hunter2".to_string())),
            key_path: None,
            use_agent: false,
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("alice"));
    }

    #[test]
    fn test_no_credentials_provider() {
        assert!(NoCredentials.lookup("example.com").is_none());
    }
}
