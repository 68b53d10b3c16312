//! Process-wide reuse of transports.
//!
//! Establishing a transport costs a TCP connect, an SSH handshake,
//! authentication and a capability probe, so live transports are shared
//! between every handle addressing the same endpoint. The registry holds one
//! strong reference per key; eviction only drops that reference, so handles
//! created earlier keep using the old transport until they are done with it.

use crate::ssh::params::ConnectionParams;
use crate::ssh::transport::Transport;
use sshvfs_platform::SshVfsResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Map from endpoint key (`user@host:port`) to live transport.
#[derive(Default)]
pub struct TransportRegistry {
    transports: Mutex<HashMap<String, Arc<Transport>>>,
}

impl TransportRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live transport for the endpoint, reusing a pooled one when
    /// its liveness check passes and connecting a fresh one otherwise.
    pub async fn get_or_create(&self, params: ConnectionParams) -> SshVfsResult<Arc<Transport>> {
        let key = params.endpoint.to_string();
        let mut transports = self.transports.lock().await;

        if let Some(existing) = transports.get(&key) {
            if existing.validate() {
                debug!(endpoint = %key, "reusing pooled transport");
                return Ok(Arc::clone(existing));
            }
            // Dead connection; drop the registry's reference. Handles still
            // holding it are unaffected.
            info!(endpoint = %key, "pooled transport failed liveness check, reconnecting");
            transports.remove(&key);
        }

        let transport = Arc::new(Transport::connect(params).await?);
        transports.insert(key, Arc::clone(&transport));
        Ok(transport)
    }

    /// Number of pooled transports, live or not.
    pub async fn len(&self) -> usize {
        self.transports.lock().await.len()
    }

    /// Whether the registry holds no transports.
    pub async fn is_empty(&self) -> bool {
        self.transports.lock().await.is_empty()
    }

    /// Disconnects and forgets every pooled transport.
    pub async fn shutdown(&self) {
        let mut transports = self.transports.lock().await;
        for (key, transport) in transports.drain() {
            debug!(endpoint = %key, "shutting down pooled transport");
            transport.disconnect().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_starts_empty() {
        let registry = TransportRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
    }
}
