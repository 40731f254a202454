//! Connection destinations.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::{ClientError, ClientResult};

/// A validated `(host, port)` destination.
///
/// The host is kept as given: a dotted-quad or IPv6 literal is used directly,
/// anything else is resolved when the connection is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the host is empty or contains
    /// whitespace, or if the port is 0.
    pub fn new(host: impl Into<String>, port: u16) -> ClientResult<Self> {
        let host = host.into();
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation("host must not be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ClientError::validation(format!(
                "host contains whitespace: {:?}",
                host
            )));
        }
        if port == 0 {
            return Err(ClientError::validation("port must be between 1 and 65535"));
        }

        Ok(Self {
            host: trimmed.to_string(),
            port,
        })
    }

    /// Creates an endpoint from a host and a textual port.
    pub fn parse(host: &str, port: &str) -> ClientResult<Self> {
        let port = port.trim();
        if port.is_empty() {
            return Err(ClientError::validation("port must not be empty"));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| ClientError::validation(format!("invalid port: {:?}", port)))?;
        Self::new(host, port)
    }

    /// Returns the host as given.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the host as an IP address if it is a literal.
    ///
    /// Dotted-quad IPv4 is checked first; bracketed or bare IPv6 literals
    /// are accepted too.
    pub fn literal_ip(&self) -> Option<IpAddr> {
        if let Ok(v4) = self.host.parse::<Ipv4Addr>() {
            return Some(IpAddr::V4(v4));
        }
        let unbracketed = self
            .host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host);
        unbracketed.parse::<IpAddr>().ok()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal_ip() {
            Some(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

impl FromStr for Endpoint {
    type Err = ClientError;

    /// Parses `host:port` (use `[addr]:port` for IPv6).
    fn from_str(s: &str) -> ClientResult<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ClientError::validation(format!("expected host:port, got {:?}", s)))?;
        Self::parse(host, port)
    }
}
