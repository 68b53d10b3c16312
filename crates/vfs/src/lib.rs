//! # sshvfs
//!
//! A virtual file system that presents files reachable over SSH/SFTP as a
//! streamable byte store for a host query engine.
//!
//! SFTP sessions over long-lived SSH connections are expensive to establish
//! but cheap to reuse, and cost-optimised storage boxes cap concurrent
//! channels and sessions aggressively. This crate keeps one authenticated
//! transport per endpoint, lends a small pool of SFTP sessions out one
//! borrower at a time, and streams large uploads as chunked, overlapped
//! append-mode writes so the destination file is assembled in place with no
//! temporaries.
//!
//! # Architecture
//!
//! 1. **Transport** ([`ssh::transport`]) - one authenticated SSH connection
//!    per endpoint: capability probing, keepalive, command execution, SFTP
//!    primitives
//! 2. **Session pool** ([`ssh::pool`]) - bounded reuse of SFTP sessions
//!    within a transport
//! 3. **Registry** ([`ssh::registry`]) - process-wide transport reuse with
//!    liveness checks and reconnection
//! 4. **Write pipeline** ([`fs::handle`]) - producer-paced chunking with
//!    bounded concurrent uploaders and ordered append-mode assembly
//! 5. **Facade** ([`fs::filesystem`]) - the file-system surface the engine
//!    binds to
//!
//! # Example
//!
//! ```rust,no_run
//! use sshvfs::{OpenMode, SshFileSystem, SshVfsConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = SshFileSystem::new(SshVfsConfig::default());
//!
//! let mut out = fs
//!     .open("ssh://alice@example.com/data/events.csv", OpenMode::Write)
//!     .await?;
//! out.write(b"id,ts\n1,2026-01-01\n").await?;
//! out.close().await?;
//!
//! let mut back = fs
//!     .open("ssh://alice@example.com/data/events.csv", OpenMode::Read)
//!     .await?;
//! let mut buf = vec![0u8; 5];
//! let read = back.read(&mut buf).await?;
//! assert_eq!(&buf[..read], b"id,ts");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod fs;
pub mod ssh;

pub use fs::{OpenMode, SshFileHandle, SshFileSystem};
pub use ssh::{
    ConnectionParams, Endpoint, RemoteAddress, SshVfsConfig, Transport, TransportRegistry,
};
pub use sshvfs_platform::{
    CredentialProvider, Credentials, NoCredentials, RemoteFileStore, RemoteMetadata, SshVfsError,
    SshVfsResult,
};
