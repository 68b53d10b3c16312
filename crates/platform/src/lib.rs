//! # sshvfs Platform
//!
//! Core types and traits shared across the sshvfs virtual file system.
//!
//! This crate provides:
//! - Unified error types (`SshVfsError`, `SshVfsResult`)
//! - The seam traits the transport layer implements and the file-handle
//!   layer consumes (`RemoteFileStore`, `CredentialProvider`)
//!
//! # Examples
//!
//! ```
//! use sshvfs_platform::{SshVfsError, SshVfsResult};
//!
//! fn example_function() -> SshVfsResult<String> {
//!     Ok("connected".to_string())
//! }
//!
//! # fn main() -> SshVfsResult<()> {
//! let result = example_function()?;
//! assert_eq!(result, "connected");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod error;
pub mod traits;

pub use error::{SshVfsError, SshVfsResult};
pub use traits::{
    CredentialProvider, Credentials, NoCredentials, RemoteFileStore, RemoteMetadata,
};

/// Platform version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
