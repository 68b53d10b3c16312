//! Connection and session management.
//!
//! The pieces compose bottom-up:
//!
//! 1. **Address** ([`address`]) - endpoint identity and address parsing
//! 2. **Parameters** ([`params`]) - tuning options and connection parameters
//! 3. **Backoff** ([`backoff`]) - retry schedule for transient connect failures
//! 4. **Pool** ([`pool`]) - bounded pool of reusable SFTP sessions
//! 5. **Transport** ([`transport`]) - one authenticated SSH connection
//! 6. **Registry** ([`registry`]) - process-wide transport reuse

pub mod address;
pub mod backoff;
pub mod params;
pub mod pool;
pub mod registry;
pub mod transport;

pub use address::{Endpoint, RemoteAddress, DEFAULT_PORT};
pub use backoff::ExponentialBackoff;
pub use params::{ConnectionParams, SshVfsConfig, MAX_SFTP_POOL_SIZE, MIN_SFTP_POOL_SIZE};
pub use pool::{PooledSession, SessionPool};
pub use registry::TransportRegistry;
pub use transport::Transport;
