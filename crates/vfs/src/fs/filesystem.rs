//! File-system facade over the SSH transport layer.

use crate::fs::handle::{OpenMode, SshFileHandle};
use crate::ssh::address::{self, Endpoint, RemoteAddress};
use crate::ssh::params::{ConnectionParams, SshVfsConfig};
use crate::ssh::registry::TransportRegistry;
use crate::ssh::transport::Transport;
use sshvfs_platform::{
    CredentialProvider, NoCredentials, RemoteFileStore, RemoteMetadata, SshVfsError, SshVfsResult,
};
use std::sync::Arc;
use tracing::debug;

/// Virtual file system presenting SSH/SFTP endpoints as a byte store.
///
/// The facade parses `ssh://`, `sshfs://` and `sftp://` addresses, resolves
/// credentials, reuses transports through the registry, and hands out file
/// handles bound to them.
///
/// # Example
///
/// ```rust,no_run
/// use sshvfs::{OpenMode, SshFileSystem, SshVfsConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = SshFileSystem::new(SshVfsConfig::default());
///
/// let mut handle = fs
///     .open("ssh://alice@example.com/data/out.bin", OpenMode::Write)
///     .await?;
/// handle.write(b"hello over sftp").await?;
/// handle.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SshFileSystem {
    config: SshVfsConfig,
    credentials: Arc<dyn CredentialProvider>,
    registry: TransportRegistry,
}

impl SshFileSystem {
    /// Creates a file system with no credential source; endpoints then rely
    /// on users embedded in addresses and on the SSH agent.
    pub fn new(config: SshVfsConfig) -> Self {
        Self::with_credentials(config, Arc::new(NoCredentials))
    }

    /// Creates a file system that resolves credentials through the given
    /// provider (typically the embedding engine's secret layer).
    pub fn with_credentials(config: SshVfsConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            config,
            credentials,
            registry: TransportRegistry::new(),
        }
    }

    /// Whether this file system handles the given path.
    pub fn can_handle(path: &str) -> bool {
        address::is_remote_address(path)
    }

    /// The tuning configuration in effect.
    pub fn config(&self) -> &SshVfsConfig {
        &self.config
    }

    /// Opens a remote file.
    pub async fn open(&self, url: &str, mode: OpenMode) -> SshVfsResult<SshFileHandle> {
        let (transport, path) = self.resolve(url).await?;
        let store: Arc<dyn RemoteFileStore> = transport;
        Ok(SshFileHandle::new(store, path, mode, &self.config))
    }

    /// Reads at an absolute offset: seeks the handle's cursor, then reads.
    pub async fn read_at(
        &self,
        handle: &mut SshFileHandle,
        location: u64,
        buf: &mut [u8],
    ) -> SshVfsResult<usize> {
        handle.seek(location);
        handle.read(buf).await
    }

    /// Writes at the stream position. Positional writes are not supported;
    /// the upload stream is strictly sequential.
    pub async fn write(&self, handle: &mut SshFileHandle, data: &[u8]) -> SshVfsResult<()> {
        handle.write(data).await
    }

    /// Whether a stat on the path succeeds. Every failure classifies as
    /// "does not exist" at this layer.
    pub async fn file_exists(&self, url: &str) -> bool {
        self.stat_url(url).await.is_ok()
    }

    /// Whether the path exists and its permission bits mark a directory.
    pub async fn directory_exists(&self, url: &str) -> bool {
        matches!(self.stat_url(url).await, Ok(metadata) if metadata.is_dir)
    }

    /// Removes a remote file.
    pub async fn remove_file(&self, url: &str) -> SshVfsResult<()> {
        let (transport, path) = self.resolve(url).await?;
        transport.remove_file(&path).await
    }

    /// Renames a remote file with overwrite semantics. Both addresses must
    /// name the same endpoint; the rename happens server-side.
    pub async fn move_file(&self, source: &str, target: &str) -> SshVfsResult<()> {
        let (transport, from) = self.resolve(source).await?;
        let target_address = address::parse(target)?;
        let target_endpoint = self.endpoint_for(&target_address)?;
        if &target_endpoint != transport.endpoint() {
            return Err(SshVfsError::Config(format!(
                "cannot move between endpoints {} and {}",
                transport.endpoint(),
                target_endpoint
            )));
        }
        transport.rename(&from, &target_address.path).await
    }

    /// Creates a directory and any missing ancestors. Always SFTP; paths
    /// never flow into a remote shell. Idempotent.
    pub async fn create_directory(&self, url: &str) -> SshVfsResult<()> {
        let (transport, path) = self.resolve(url).await?;
        transport.create_dir_all(&path).await
    }

    /// Removes an empty directory. Always SFTP.
    pub async fn remove_directory(&self, url: &str) -> SshVfsResult<()> {
        let (transport, path) = self.resolve(url).await?;
        transport.remove_dir(&path).await
    }

    /// Trivial glob: the path itself when it exists, nothing otherwise.
    pub async fn glob(&self, url: &str) -> Vec<String> {
        if self.file_exists(url).await {
            vec![url.to_string()]
        } else {
            Vec::new()
        }
    }

    /// Remote files support seeking.
    pub fn can_seek(&self) -> bool {
        true
    }

    /// Remote files are not on local disk.
    pub fn on_disk(&self) -> bool {
        false
    }

    /// Disconnects every pooled transport.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    async fn stat_url(&self, url: &str) -> SshVfsResult<RemoteMetadata> {
        let (transport, path) = self.resolve(url).await?;
        transport.stat(&path).await
    }

    /// Parses the address, resolves credentials, and returns a live
    /// transport for its endpoint together with the remote path.
    async fn resolve(&self, url: &str) -> SshVfsResult<(Arc<Transport>, String)> {
        let parsed = address::parse(url)?;
        let endpoint = self.endpoint_for(&parsed)?;
        debug!(endpoint = %endpoint, path = %parsed.path, "resolving transport");

        let credentials = self.credentials.lookup(&parsed.host).unwrap_or_default();
        let params = ConnectionParams {
            endpoint,
            credentials,
            config: self.config.clone(),
        };
        let transport = self.registry.get_or_create(params).await?;
        Ok((transport, parsed.path))
    }

    fn endpoint_for(&self, parsed: &RemoteAddress) -> SshVfsResult<Endpoint> {
        let user = parsed
            .user
            .clone()
            .or_else(|| {
                self.credentials
                    .lookup(&parsed.host)
                    .and_then(|credentials| credentials.username)
            })
            .ok_or_else(|| {
                SshVfsError::Config(format!(
                    "no user for {} (put one in the address or supply it via a credential)",
                    parsed.host
                ))
            })?;
        Ok(Endpoint {
            user,
            host: parsed.host.clone(),
            port: parsed.port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshvfs_platform::Credentials;

    #[test]
    fn test_can_handle() {
        assert!(SshFileSystem::can_handle("ssh://alice@example.com/f"));
        assert!(SshFileSystem::can_handle("sshfs://example.com/f"));
        assert!(SshFileSystem::can_handle("sftp://example.com:2222/f"));
        assert!(!SshFileSystem::can_handle("/tmp/f"));
        assert!(!SshFileSystem::can_handle("https://example.com/f"));
    }

    #[tokio::test]
    async fn test_open_without_user_is_a_config_error() {
        let fs = SshFileSystem::new(SshVfsConfig::default());
        let result = fs.open("ssh://example.com/data", OpenMode::Read).await;
        assert!(matches!(result, Err(SshVfsError::Config(_))));
    }

    #[tokio::test]
    async fn test_credential_provider_supplies_user() {
        struct FixedUser;
        impl CredentialProvider for FixedUser {
            fn lookup(&self, _host: &str) -> Option<Credentials> {
                Some(Credentials {
                    username: Some("alice".to_string()),
                    ..Default::default()
                })
            }
        }

        let fs = SshFileSystem::with_credentials(SshVfsConfig::default(), Arc::new(FixedUser));
        let parsed = address::parse("ssh://example.com/data").unwrap();
        let endpoint = fs.endpoint_for(&parsed).unwrap();
        assert_eq!(endpoint.to_string(), "alice@example.com:22");
    }

    #[tokio::test]
    async fn test_move_between_endpoints_rejected_before_any_network_io() {
        let fs = SshFileSystem::new(SshVfsConfig::default());
        // Different hosts never even parse into one endpoint; the mismatch is
        // reported without resolving a transport for the target.
        let parsed = address::parse("ssh://alice@a.example.com/x").unwrap();
        let endpoint_a = fs.endpoint_for(&parsed).unwrap();
        let parsed_b = address::parse("ssh://alice@b.example.com/x").unwrap();
        let endpoint_b = fs.endpoint_for(&parsed_b).unwrap();
        assert_ne!(endpoint_a, endpoint_b);
    }

    #[test]
    fn test_capabilities() {
        let fs = SshFileSystem::new(SshVfsConfig::default());
        assert!(fs.can_seek());
        assert!(!fs.on_disk());
    }
}
