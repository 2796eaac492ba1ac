//! Network reachability checks performed before each transmission.

use crate::{OutboxError, OutboxResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use url::Url;

/// Upper bound on a single reachability check.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reports whether the collector can currently be reached.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probe that always reports the network as available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

#[async_trait]
impl NetworkProbe for AlwaysReachable {
    async fn is_reachable(&self) -> bool {
        true
    }
}

/// Probe that opens (and drops) a TCP connection to the collector.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    /// Probe the host and port of `server_url`.
    pub fn for_url(server_url: &str) -> OutboxResult<Self> {
        let url = Url::parse(server_url)?;
        let host = url
            .host_str()
            .ok_or(OutboxError::InvalidUrl(url::ParseError::EmptyHost))?;
        let port = url.port_or_known_default().unwrap_or(443);

        Ok(Self {
            addr: format!("{host}:{port}"),
            timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl NetworkProbe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}
