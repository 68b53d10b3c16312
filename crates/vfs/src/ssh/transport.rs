//! SSH transport: one authenticated connection to an endpoint.
//!
//! A transport owns the SSH session, probes the server's capabilities once,
//! and carries a small pool of reusable SFTP sessions. Transports are shared
//! between file handles through [`Arc`] and reused across operations via the
//! [`TransportRegistry`](crate::ssh::registry::TransportRegistry).
//!
//! # Example
//!
//! ```rust,no_run
//! use sshvfs::ssh::address::Endpoint;
//! use sshvfs::ssh::params::{ConnectionParams, SshVfsConfig};
//! use sshvfs::ssh::transport::Transport;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = ConnectionParams {
//!     endpoint: Endpoint {
//!         user: "alice".to_string(),
//!         host: "example.com".to_string(),
//!         port: 22,
//!     },
//!     credentials: Default::default(),
//!     config: SshVfsConfig::default(),
//! };
//! let transport = Transport::connect(params).await?;
//! let output = transport.execute_command("pwd").await?;
//! println!("{}", String::from_utf8_lossy(&output));
//! # Ok(())
//! # }
//! ```

use crate::ssh::address::Endpoint;
use crate::ssh::backoff::ExponentialBackoff;
use crate::ssh::params::ConnectionParams;
use crate::ssh::pool::{PooledSession, SessionPool};
use russh::client;
use russh::keys::agent::client::AgentClient;
use russh::keys::ssh_key;
use russh::keys::{load_secret_key, PrivateKeyWithHashAlg};
use russh::{ChannelMsg, Disconnect, Preferred};
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{FileAttributes, OpenFlags};
use sshvfs_platform::{Credentials, RemoteFileStore, RemoteMetadata, SshVfsError, SshVfsResult};
use std::borrow::Cow;
use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Inner slice size for SFTP reads; matches the protocol's natural packet
/// size so large requests cannot stall the session.
const READ_SLICE: usize = 32 * 1024;

/// SSH client handler.
///
/// Host keys are accepted without known-hosts verification; restricted
/// storage endpoints rarely publish stable keys. The accepted key is
/// recorded at debug level.
struct ClientHandler;

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(algorithm = %server_public_key.algorithm(), "accepting server host key");
        Ok(true)
    }
}

/// A live, authenticated SSH connection to one endpoint.
pub struct Transport {
    params: ConnectionParams,
    handle: client::Handle<ClientHandler>,
    connected: AtomicBool,
    supports_commands: bool,
    commands_disabled: AtomicBool,
    pool: SessionPool<SftpSession>,
    // The underlying session is not safe under concurrent SFTP use; reads
    // and chunk uploads each serialise on their own lock.
    read_lock: Mutex<()>,
    upload_lock: Mutex<()>,
    command_lock: Mutex<()>,
}

impl Transport {
    /// Connects, authenticates and probes the endpoint.
    ///
    /// Transient failures (DNS, socket, handshake) are retried up to the
    /// configured budget with exponential backoff. Authentication failures
    /// surface immediately and are never retried.
    pub async fn connect(params: ConnectionParams) -> SshVfsResult<Self> {
        let mut backoff = ExponentialBackoff::new(
            params.config.initial_retry_delay,
            params.config.max_retries,
        );

        loop {
            match Self::connect_once(&params).await {
                Ok(transport) => {
                    if backoff.attempt() > 0 {
                        info!(
                            endpoint = %params.endpoint,
                            attempt = backoff.attempt() + 1,
                            "connection successful after retry"
                        );
                    }
                    return Ok(transport);
                }
                Err(e) if e.is_retryable() && !backoff.exhausted() => {
                    let delay = backoff.next_backoff();
                    warn!(
                        endpoint = %params.endpoint,
                        attempt = backoff.attempt(),
                        max_retries = params.config.max_retries,
                        error = %e,
                        "connect failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn connect_once(params: &ConnectionParams) -> SshVfsResult<Self> {
        let endpoint = &params.endpoint;
        let timeout = params.config.timeout;

        let mut addrs = tokio::net::lookup_host((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| SshVfsError::Dns {
                host: endpoint.host.clone(),
                source: e,
            })?;
        let addr = addrs.next().ok_or_else(|| SshVfsError::Dns {
            host: endpoint.host.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "hostname resolved to no addresses",
            ),
        })?;

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| SshVfsError::Network {
                endpoint: endpoint.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("TCP connect timed out after {:?}", timeout),
                ),
            })?
            .map_err(|e| SshVfsError::Network {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        let keepalive = params.config.keepalive_interval;
        if !keepalive.is_zero() {
            debug!(interval = ?keepalive, "keepalive configured");
        }
        let config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: (!keepalive.is_zero()).then_some(keepalive),
            preferred: preferred_algorithms(params.config.strict_crypto),
            ..Default::default()
        });

        // The library waits for the server banner on the connected socket
        // before its side of the handshake, so one timeout bounds both.
        debug!(endpoint = %endpoint, "starting SSH handshake");
        let mut handle =
            tokio::time::timeout(timeout, client::connect_stream(config, stream, ClientHandler))
                .await
                .map_err(|_| SshVfsError::Handshake {
                    endpoint: endpoint.to_string(),
                    message: format!("server did not complete the handshake within {:?}", timeout),
                })?
                .map_err(|e| classify_handshake_error(endpoint, e))?;

        authenticate(&mut handle, endpoint, &params.credentials).await?;

        let supports_commands = detect_capabilities(&handle, endpoint).await;

        // Constrained storage boxes cap channels so aggressively that command
        // reads thrash; pre-disable them there and rely on SFTP.
        let commands_disabled = is_constrained_storage_box(&endpoint.host);
        if commands_disabled {
            info!(endpoint = %endpoint, "constrained storage box detected, command reads disabled");
        }

        Ok(Self {
            pool: SessionPool::new(params.config.sftp_pool_size),
            handle,
            connected: AtomicBool::new(true),
            supports_commands,
            commands_disabled: AtomicBool::new(commands_disabled),
            read_lock: Mutex::new(()),
            upload_lock: Mutex::new(()),
            command_lock: Mutex::new(()),
            params: params.clone(),
        })
    }

    /// The endpoint this transport is bound to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.params.endpoint
    }

    /// The parameters this transport was built with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Whether the capability probe found working command execution.
    pub fn supports_commands(&self) -> bool {
        self.supports_commands
    }

    /// Whether command execution has been disabled at runtime after observed
    /// channel failures.
    pub fn commands_disabled(&self) -> bool {
        self.commands_disabled.load(Ordering::Relaxed)
    }

    /// Whether the underlying session still accepts traffic. The registry
    /// checks this before handing the transport to a new caller.
    pub fn validate(&self) -> bool {
        self.connected.load(Ordering::Relaxed) && !self.handle.is_closed()
    }

    /// Tears the connection down: drains the SFTP pool, shuts each session
    /// down, then disconnects the SSH session.
    pub async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            for session in self.pool.drain() {
                if let Err(e) = session.close().await {
                    debug!(error = %e, "error closing pooled SFTP session");
                }
            }
            let _ = self
                .handle
                .disconnect(Disconnect::ByApplication, "shutting down", "en")
                .await;
            info!(endpoint = %self.params.endpoint, "transport disconnected");
        }
    }

    fn ensure_connected(&self) -> SshVfsResult<()> {
        if self.connected.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(SshVfsError::NotConnected {
                endpoint: self.params.endpoint.to_string(),
            })
        }
    }

    /// Executes a command on the server and returns its stdout.
    ///
    /// Fails with a command-execution error on non-zero exit, and with a
    /// resource-exhaustion error when the server refuses the channel.
    pub async fn execute_command(&self, command: &str) -> SshVfsResult<Vec<u8>> {
        self.ensure_connected()?;
        run_command(&self.handle, &self.params.endpoint, command).await
    }

    /// Borrows an SFTP session from the pool, waiting if all are lent out.
    /// The pool fills itself lazily on the first borrow.
    pub async fn borrow_sftp(&self) -> SshVfsResult<PooledSession<'_, SftpSession>> {
        self.ensure_connected()?;
        self.pool.borrow(|| self.open_sftp_session()).await
    }

    async fn open_sftp_session(&self) -> SshVfsResult<SftpSession> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| self.channel_refused(e))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| self.channel_refused(e))?;
        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SshVfsError::ResourceExhausted {
                endpoint: self.params.endpoint.to_string(),
                message: format!("SFTP session initialisation failed: {}", e),
            })
    }

    fn channel_refused(&self, e: russh::Error) -> SshVfsError {
        SshVfsError::ResourceExhausted {
            endpoint: self.params.endpoint.to_string(),
            message: e.to_string(),
        }
    }

    /// Creates a directory and any missing ancestors. Existing directories
    /// are not an error.
    pub async fn create_dir_all(&self, path: &str) -> SshVfsResult<()> {
        self.ensure_connected()?;
        let sftp = self.borrow_sftp().await?;
        create_dir_components(&sftp, path).await
    }

    /// Removes an empty directory.
    pub async fn remove_dir(&self, path: &str) -> SshVfsResult<()> {
        self.ensure_connected()?;
        let sftp = self.borrow_sftp().await?;
        sftp.remove_dir(path)
            .await
            .map_err(|e| remote_io(path, "rmdir", e))
    }

    /// Removes a file.
    pub async fn remove_file(&self, path: &str) -> SshVfsResult<()> {
        self.ensure_connected()?;
        let sftp = self.borrow_sftp().await?;
        sftp.remove_file(path)
            .await
            .map_err(|e| remote_io(path, "unlink", e))
    }

    /// Renames a file with overwrite semantics.
    pub async fn rename(&self, from: &str, to: &str) -> SshVfsResult<()> {
        self.ensure_connected()?;
        let sftp = self.borrow_sftp().await?;
        match sftp.rename(from, to).await {
            Ok(()) => Ok(()),
            // Plain SFTP rename refuses to overwrite on some servers; clear
            // the target and try once more.
            Err(first) => {
                if sftp.metadata(to).await.is_ok() {
                    sftp.remove_file(to)
                        .await
                        .map_err(|e| remote_io(to, "unlink", e))?;
                    sftp.rename(from, to)
                        .await
                        .map_err(|e| remote_io(from, "rename", e))
                } else {
                    Err(remote_io(from, "rename", first))
                }
            }
        }
    }

    async fn read_bytes_sftp(
        &self,
        path: &str,
        offset: u64,
        buf: &mut [u8],
    ) -> SshVfsResult<usize> {
        // The session is not concurrency-safe; all SFTP reads on this
        // transport take their turn here.
        let _serialized = self.read_lock.lock().await;
        let sftp = self.borrow_sftp().await?;

        let mut file = sftp
            .open_with_flags(path, OpenFlags::READ)
            .await
            .map_err(|e| remote_io(path, "open for read", e))?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| SshVfsError::RemoteIo {
                path: path.to_string(),
                message: format!("seek to {} failed: {}", offset, e),
            })?;

        let mut total = 0;
        while total < buf.len() {
            let upper = buf.len().min(total + READ_SLICE);
            let n = file
                .read(&mut buf[total..upper])
                .await
                .map_err(|e| SshVfsError::RemoteIo {
                    path: path.to_string(),
                    message: format!("read at {} failed: {}", offset + total as u64, e),
                })?;
            if n == 0 {
                break;
            }
            total += n;
        }
        debug!(path, offset, requested = buf.len(), read = total, "SFTP read");
        Ok(total)
    }

    /// Command-execution fast path for byte-range reads.
    ///
    /// Returns `Ok(None)` when the channel was refused; the caller falls back
    /// to SFTP and command reads stay disabled for this transport.
    async fn read_bytes_command(
        &self,
        path: &str,
        offset: u64,
        buf: &mut [u8],
    ) -> SshVfsResult<Option<usize>> {
        // dd with byte-addressed skip/count transfers exactly the requested
        // range, like an HTTP range request. One command at a time: servers
        // with strict channel caps drop concurrent exec channels.
        let command = format!(
            "dd if={} bs=4096 iflag=skip_bytes,count_bytes skip={} count={} status=none",
            shell_quote(path),
            offset,
            buf.len()
        );
        let _serialized = self.command_lock.lock().await;

        let mut channel = match self.handle.channel_open_session().await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(
                    endpoint = %self.params.endpoint,
                    error = %e,
                    "channel open refused, disabling command reads for this transport"
                );
                self.commands_disabled.store(true, Ordering::Relaxed);
                return Ok(None);
            }
        };
        if let Err(e) = channel.exec(true, command.as_str()).await {
            warn!(
                endpoint = %self.params.endpoint,
                error = %e,
                "exec refused, disabling command reads for this transport"
            );
            self.commands_disabled.store(true, Ordering::Relaxed);
            return Ok(None);
        }

        let mut total = 0;
        let mut exit_status = 0u32;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => {
                    if total < buf.len() {
                        let n = data.len().min(buf.len() - total);
                        buf[total..total + n].copy_from_slice(&data[..n]);
                        total += n;
                    }
                }
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = status,
                _ => {}
            }
        }

        if exit_status != 0 && total == 0 {
            return Err(SshVfsError::Command {
                command,
                exit_status,
            });
        }
        debug!(path, offset, requested = buf.len(), read = total, "command read");
        Ok(Some(total))
    }
}

#[async_trait::async_trait]
impl RemoteFileStore for Transport {
    async fn upload_chunk(&self, path: &str, data: &[u8], append: bool) -> SshVfsResult<()> {
        self.ensure_connected()?;
        // One chunk at a time on the wire; callers already sequence parts.
        let _serialized = self.upload_lock.lock().await;
        let sftp = self.borrow_sftp().await?;

        if let Some((parent, _)) = path.rsplit_once('/') {
            if !parent.is_empty() {
                create_dir_components(&sftp, parent).await?;
            }
        }

        let flags = if append {
            OpenFlags::WRITE | OpenFlags::APPEND
        } else {
            OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE
        };
        let mut file = sftp
            .open_with_flags(path, flags)
            .await
            .map_err(|e| remote_io(path, if append { "open for append" } else { "create" }, e))?;

        let mut written = 0;
        while written < data.len() {
            let n = file
                .write(&data[written..])
                .await
                .map_err(|e| SshVfsError::RemoteIo {
                    path: path.to_string(),
                    message: format!("write failed after {} bytes: {}", written, e),
                })?;
            if n == 0 {
                return Err(SshVfsError::StalledWrite {
                    path: path.to_string(),
                    written: written as u64,
                    total: data.len() as u64,
                });
            }
            written += n;
        }
        file.flush().await.map_err(|e| SshVfsError::RemoteIo {
            path: path.to_string(),
            message: format!("flush failed: {}", e),
        })?;
        file.shutdown().await.map_err(|e| SshVfsError::RemoteIo {
            path: path.to_string(),
            message: format!("close failed: {}", e),
        })?;

        debug!(path, bytes = data.len(), append, "chunk uploaded");
        Ok(())
    }

    async fn read_bytes(&self, path: &str, offset: u64, buf: &mut [u8]) -> SshVfsResult<usize> {
        self.ensure_connected()?;
        if buf.is_empty() {
            return Ok(0);
        }

        if self.supports_commands && !self.commands_disabled.load(Ordering::Relaxed) {
            if let Some(read) = self.read_bytes_command(path, offset, buf).await? {
                return Ok(read);
            }
            // Channel refused mid-flight; SFTP from here on.
        }
        self.read_bytes_sftp(path, offset, buf).await
    }

    async fn stat(&self, path: &str) -> SshVfsResult<RemoteMetadata> {
        self.ensure_connected()?;
        let sftp = self.borrow_sftp().await?;
        let attrs = sftp
            .metadata(path)
            .await
            .map_err(|e| remote_io(path, "stat", e))?;
        Ok(RemoteMetadata {
            size: attrs.size,
            modified_unix_secs: attrs.mtime.map(u64::from),
            is_dir: attrs.file_type().is_dir(),
        })
    }

    async fn truncate(&self, path: &str, size: u64) -> SshVfsResult<()> {
        self.ensure_connected()?;
        let sftp = self.borrow_sftp().await?;
        let metadata = FileAttributes {
            size: Some(size),
            ..Default::default()
        };
        sftp.set_metadata(path, metadata)
            .await
            .map_err(|e| remote_io(path, "truncate", e))
    }
}

/// Creates every component of `dir_path`, treating "already exists" as
/// success.
async fn create_dir_components(sftp: &SftpSession, dir_path: &str) -> SshVfsResult<()> {
    let mut current = String::new();
    if dir_path.starts_with('/') {
        current.push('/');
    }
    for component in dir_path.split('/') {
        if component.is_empty() {
            continue;
        }
        if !current.is_empty() && !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(component);

        if let Err(e) = sftp.create_dir(&current).await {
            // SFTPv3 servers report an existing directory as a bare failure;
            // a stat disambiguates.
            if sftp.metadata(&current).await.is_err() {
                return Err(remote_io(&current, "mkdir", e));
            }
        }
    }
    Ok(())
}

async fn run_command(
    handle: &client::Handle<ClientHandler>,
    endpoint: &Endpoint,
    command: &str,
) -> SshVfsResult<Vec<u8>> {
    let mut channel =
        handle
            .channel_open_session()
            .await
            .map_err(|e| SshVfsError::ResourceExhausted {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
    channel
        .exec(true, command)
        .await
        .map_err(|e| SshVfsError::ResourceExhausted {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

    let mut stdout = Vec::new();
    let mut exit_status = 0u32;
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
            ChannelMsg::ExitStatus {
                exit_status: status,
            } => exit_status = status,
            _ => {}
        }
    }

    if exit_status != 0 {
        return Err(SshVfsError::Command {
            command: command.to_string(),
            exit_status,
        });
    }
    Ok(stdout)
}

async fn authenticate(
    handle: &mut client::Handle<ClientHandler>,
    endpoint: &Endpoint,
    credentials: &Credentials,
) -> SshVfsResult<()> {
    let user = endpoint.user.as_str();

    // The configured method is used exclusively. A provided password never
    // falls through to a key, a provided key never falls through to the
    // agent.
    if let Some(password) = &credentials.password {
        let result = handle
            .authenticate_password(user, password.as_str())
            .await
            .map_err(|e| auth_error(endpoint, format!("password authentication failed: {}", e)))?;
        if result.success() {
            debug!(endpoint = %endpoint, "password authentication succeeded");
            return Ok(());
        }
        return Err(auth_error(
            endpoint,
            "password rejected (check username and password)".to_string(),
        ));
    }

    if let Some(key_path) = &credentials.key_path {
        let key = load_secret_key(key_path, None).map_err(|e| {
            auth_error(
                endpoint,
                format!("could not load key file {}: {}", key_path.display(), e),
            )
        })?;
        let hash = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| auth_error(endpoint, e.to_string()))?
            .flatten();
        let result = handle
            .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), hash))
            .await
            .map_err(|e| auth_error(endpoint, format!("key authentication failed: {}", e)))?;
        if result.success() {
            debug!(endpoint = %endpoint, "public key authentication succeeded");
            return Ok(());
        }
        return Err(auth_error(
            endpoint,
            format!(
                "key {} rejected by server (check file permissions and authorized_keys)",
                key_path.display()
            ),
        ));
    }

    if credentials.use_agent || std::env::var_os("SSH_AUTH_SOCK").is_some() {
        return authenticate_agent(handle, endpoint).await;
    }

    Err(auth_error(
        endpoint,
        "no authentication method available (provide a password, a key file, or use_agent=true)"
            .to_string(),
    ))
}

async fn authenticate_agent(
    handle: &mut client::Handle<ClientHandler>,
    endpoint: &Endpoint,
) -> SshVfsResult<()> {
    if std::env::var_os("SSH_AUTH_SOCK").is_none() {
        return Err(auth_error(
            endpoint,
            "agent authentication requested but SSH_AUTH_SOCK is not set".to_string(),
        ));
    }

    let mut agent = AgentClient::connect_env()
        .await
        .map_err(|e| auth_error(endpoint, format!("could not connect to the SSH agent: {}", e)))?;
    let identities = agent
        .request_identities()
        .await
        .map_err(|e| auth_error(endpoint, format!("could not list agent identities: {}", e)))?;
    if identities.is_empty() {
        return Err(auth_error(
            endpoint,
            "the SSH agent holds no identities".to_string(),
        ));
    }

    // Identities are tried in the order the agent returns them.
    for identity in identities {
        let hash = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| auth_error(endpoint, e.to_string()))?
            .flatten();
        match handle
            .authenticate_publickey_with(endpoint.user.as_str(), identity, hash, &mut agent)
            .await
        {
            Ok(result) if result.success() => {
                debug!(endpoint = %endpoint, "agent authentication succeeded");
                return Ok(());
            }
            Ok(_) => continue,
            Err(e) => {
                debug!(endpoint = %endpoint, error = %e, "agent identity rejected");
                continue;
            }
        }
    }

    Err(auth_error(
        endpoint,
        "agent authentication failed (tried all identities)".to_string(),
    ))
}

async fn detect_capabilities(handle: &client::Handle<ClientHandler>, endpoint: &Endpoint) -> bool {
    // 'pwd' rather than the no-op ':' because restricted shells reject ':'
    // while still answering basic builtins.
    match run_command(handle, endpoint, "pwd").await {
        Ok(_) => {
            info!(endpoint = %endpoint, "server supports command execution");
            true
        }
        Err(e) => {
            info!(
                endpoint = %endpoint,
                error = %e,
                "server is SFTP-only, command execution disabled"
            );
            false
        }
    }
}

/// Key-exchange offer under `strict_crypto`: non-NIST curves and
/// contemporary DH groups only.
const STRICT_KEX: &[russh::kex::Name] = &[
    russh::kex::CURVE25519,
    russh::kex::CURVE25519_PRE_RFC_8731,
    russh::kex::DH_G16_SHA512,
    russh::kex::DH_G14_SHA256,
    russh::kex::EXTENSION_SUPPORT_AS_CLIENT,
];

fn preferred_algorithms(strict_crypto: bool) -> Preferred {
    if strict_crypto {
        Preferred {
            kex: Cow::Borrowed(STRICT_KEX),
            ..Preferred::default()
        }
    } else {
        Preferred::default()
    }
}

fn classify_handshake_error(endpoint: &Endpoint, e: russh::Error) -> SshVfsError {
    match e {
        russh::Error::NoCommonAlgo { .. } => SshVfsError::Handshake {
            endpoint: endpoint.to_string(),
            message: format!("key exchange failed: {}", e),
        },
        russh::Error::IO(source) => SshVfsError::Network {
            endpoint: endpoint.to_string(),
            source,
        },
        other => SshVfsError::Handshake {
            endpoint: endpoint.to_string(),
            message: other.to_string(),
        },
    }
}

fn auth_error(endpoint: &Endpoint, message: String) -> SshVfsError {
    SshVfsError::Auth {
        endpoint: endpoint.to_string(),
        message,
    }
}

fn remote_io(path: &str, operation: &str, e: russh_sftp::client::error::Error) -> SshVfsError {
    SshVfsError::RemoteIo {
        path: path.to_string(),
        message: format!("{} failed: {}", operation, e),
    }
}

/// Single-quotes a string for safe interpolation into a remote command line.
/// Embedded quotes become `'\''`.
pub(crate) fn shell_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Hosts of the constrained storage-box product get command reads
/// pre-disabled; their channel caps make exec channels unusable under load.
fn is_constrained_storage_box(host: &str) -> bool {
    host.contains("storagebox.de")
}
