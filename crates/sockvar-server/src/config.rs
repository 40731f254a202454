//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 60013;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,

    /// Time allowed for each read or write on a connection.
    pub connection_timeout: Duration,

    /// Maximum concurrent connections.
    pub max_connections: usize,

    /// Largest request frame accepted, terminator included.
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connection_timeout: Duration::from_secs(10),
            max_connections: 64,
            max_request_size: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration listening on `listen_addr`.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    /// Builder: set connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Builder: set max connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Builder: set max request size.
    pub fn with_max_request_size(mut self, max: usize) -> Self {
        self.max_request_size = max;
        self
    }
}

/// Returns the default listen address, `127.0.0.1:60013`.
pub fn default_listen_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr.port(), DEFAULT_PORT);
        assert!(config.listen_addr.ip().is_loopback());
        assert_eq!(config.connection_timeout, Duration::from_secs(10));
        assert_eq!(config.max_connections, 64);
        assert_eq!(config.max_request_size, 64 * 1024);
    }

    #[test]
    fn custom_config() {
        let addr: SocketAddr = "0.0.0.0:7000".parse().unwrap();
        let config = ServerConfig::new(addr)
            .with_connection_timeout(Duration::from_secs(60))
            .with_max_connections(8)
            .with_max_request_size(512);

        assert_eq!(config.listen_addr, addr);
        assert_eq!(config.connection_timeout, Duration::from_secs(60));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.max_request_size, 512);
    }
}
