//! Remote address parsing.
//!
//! Addresses follow `scheme://[user@]host[:port]{'/'|':'}path` with scheme
//! one of `ssh`, `sshfs`, `sftp`. The separator decides how the remote path
//! is interpreted:
//!
//! - `ssh://host/data/file` — home-relative path `data/file`
//! - `ssh://host:/var/data/file` — absolute path `/var/data/file` (SCP style)
//! - `ssh://host:data/file` — home-relative path `data/file` (SCP style)
//! - `ssh://host:2222/data/file` — port 2222, home-relative `data/file`

use sshvfs_platform::{SshVfsError, SshVfsResult};
use std::fmt;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

const SCHEMES: [&str; 3] = ["ssh://", "sshfs://", "sftp://"];

/// Identity of a reusable transport: `(user, host, port)`.
///
/// Immutable once a transport is built; rendered as `user@host:port`, which
/// is also the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Login user.
    pub user: String,
    /// Remote hostname.
    pub host: String,
    /// Remote port.
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// A parsed remote address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress {
    /// Login user, when the address carried one.
    pub user: Option<String>,
    /// Remote hostname.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Remote path. Absolute when it starts with `/`, otherwise relative to
    /// the login user's home directory.
    pub path: String,
}

/// Whether a path looks like an address this file system handles.
pub fn is_remote_address(path: &str) -> bool {
    SCHEMES.iter().any(|scheme| path.starts_with(scheme))
}

/// Parses a remote address.
pub fn parse(url: &str) -> SshVfsResult<RemoteAddress> {
    let rest = SCHEMES
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .ok_or_else(|| {
            SshVfsError::Address(format!(
                "'{}' does not start with ssh://, sshfs:// or sftp://",
                url
            ))
        })?;

    let (user, rest) = match rest.find('@') {
        Some(0) => {
            return Err(SshVfsError::Address(format!("empty user in '{}'", url)));
        }
        Some(at) => (Some(rest[..at].to_string()), &rest[at + 1..]),
        None => (None, rest),
    };

    let host_end = rest.find([':', '/']).ok_or_else(|| {
        SshVfsError::Address(format!("missing remote path in '{}'", url))
    })?;
    if host_end == 0 {
        return Err(SshVfsError::Address(format!("empty host in '{}'", url)));
    }
    let host = rest[..host_end].to_string();
    let rest = &rest[host_end..];

    // A ':' may introduce either a port (all digits, followed by another
    // separator) or an SCP-style path. `host:2222/file` is a port,
    // `host:2222` alone is the path "2222".
    let (port, sep_and_path) = match rest.strip_prefix(':') {
        Some(after) => {
            let digits_end = after
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after.len());
            match after[digits_end..].chars().next() {
                Some(':') | Some('/') if digits_end > 0 => {
                    let port = after[..digits_end].parse::<u16>().map_err(|_| {
                        SshVfsError::Address(format!("invalid port in '{}'", url))
                    })?;
                    (port, &after[digits_end..])
                }
                _ => (DEFAULT_PORT, rest),
            }
        }
        None => (DEFAULT_PORT, rest),
    };

    // ':' keeps the remainder verbatim (absolute or home-relative); '/'
    // strips the slash and yields a home-relative path.
    let path = match sep_and_path.chars().next() {
        Some(':') => sep_and_path[1..].to_string(),
        Some('/') => sep_and_path[1..].to_string(),
        _ => {
            return Err(SshVfsError::Address(format!(
                "missing remote path in '{}'",
                url
            )));
        }
    };
    if path.is_empty() {
        return Err(SshVfsError::Address(format!(
            "missing remote path in '{}'",
            url
        )));
    }

    Ok(RemoteAddress {
        user,
        host,
        port,
        path,
    })
}
