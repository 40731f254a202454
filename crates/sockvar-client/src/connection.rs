//! Connection management: resolve, connect, apply timeouts, one exchange.

use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use sockvar_protocol::{FrameAccumulator, FrameStatus, FrameWriter, ProtocolError, is_timeout};

use crate::endpoint::Endpoint;
use crate::error::{ClientError, ClientResult};

/// Default for each of the connect, send and receive timeouts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest single read issued while seeking the terminator.
const READ_CHUNK: usize = 4096;

/// Per-operation timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed for the TCP handshake, per resolved address.
    pub connect: Duration,
    /// Time allowed for writing the request frame.
    pub send: Duration,
    /// Time allowed for receiving the response.
    pub receive: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_TIMEOUT)
    }
}

impl Timeouts {
    /// Uses the same timeout for every operation.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            connect: timeout,
            send: timeout,
            receive: timeout,
        }
    }

    /// Sum of all timeouts: the longest a call can block once the host is
    /// resolved. Saturates at [`Duration::MAX`].
    pub fn total(&self) -> Duration {
        self.connect
            .saturating_add(self.send)
            .saturating_add(self.receive)
    }

    /// Rejects zero durations, which std sockets refuse.
    pub fn validate(&self) -> ClientResult<()> {
        for (name, value) in [
            ("connect", self.connect),
            ("send", self.send),
            ("receive", self.receive),
        ] {
            if value.is_zero() {
                return Err(ClientError::validation(format!(
                    "{} timeout must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// How the response is read from the socket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ReadMode {
    /// Exactly one bounded read; whatever has not arrived by then is lost.
    #[default]
    #[value(name = "single")]
    #[serde(rename = "single")]
    SingleRead,
    /// Keep reading until the terminator, EOF, the capacity limit or the
    /// receive deadline.
    #[value(name = "terminator")]
    #[serde(rename = "terminator")]
    UntilTerminator,
}

/// Raw bytes obtained from the receive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Bytes handed to the decoder. A single read keeps everything it got;
    /// terminator mode keeps the bytes before the terminator.
    pub body: Vec<u8>,
    /// Total bytes read, terminator included.
    pub bytes_read: usize,
    /// True if the terminator was seen.
    pub terminated: bool,
    /// True if the receive timeout expired.
    pub timed_out: bool,
}

/// An open TCP connection to one endpoint, used for a single exchange.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    endpoint: Endpoint,
    timeouts: Timeouts,
}

impl Connection {
    /// Resolves `endpoint`, connects, and applies the send and receive
    /// timeouts.
    ///
    /// Literal addresses skip name resolution. Resolved addresses are tried
    /// in order, IPv4 first, until one accepts.
    pub fn open(endpoint: &Endpoint, timeouts: &Timeouts) -> ClientResult<Self> {
        let addrs = resolve(endpoint)?;
        let mut last_error = None;

        for addr in addrs {
            debug!(addr = %addr, "connecting");
            match TcpStream::connect_timeout(&addr, timeouts.connect) {
                Ok(stream) => {
                    configure(&stream, timeouts)?;
                    return Ok(Self {
                        stream,
                        endpoint: endpoint.clone(),
                        timeouts: *timeouts,
                    });
                }
                Err(e) => {
                    debug!(addr = %addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) if is_timeout(&e) => ClientError::timeout("connect"),
            Some(e) => ClientError::Connect {
                endpoint: endpoint.to_string(),
                source: e,
            },
            None => ClientError::Resolution {
                host: endpoint.host().to_string(),
                reason: "no addresses found".to_string(),
            },
        })
    }

    /// Returns the endpoint this connection was opened to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Frames `payload` and writes the whole frame. Returns the bytes written.
    pub fn send(&mut self, payload: &[u8]) -> ClientResult<usize> {
        match FrameWriter::new(&mut self.stream).write_frame(payload) {
            Ok(n) => Ok(n),
            Err(e) if e.is_timeout() => Err(ClientError::timeout("send")),
            Err(ProtocolError::Io(e)) => Err(ClientError::Io(e)),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the response, holding at most `capacity` bytes.
    ///
    /// A timeout or early EOF is not an error here; it is reported through
    /// the flags on [`Received`].
    pub fn receive(&mut self, capacity: usize, mode: ReadMode) -> ClientResult<Received> {
        let mut acc = FrameAccumulator::with_capacity(capacity);
        let timed_out = match mode {
            ReadMode::SingleRead => self.read_once(&mut acc)?,
            ReadMode::UntilTerminator => self.read_until_terminator(&mut acc)?,
        };

        let body = match mode {
            ReadMode::SingleRead => acc.as_bytes(),
            ReadMode::UntilTerminator => acc.body(),
        };

        Ok(Received {
            body: body.to_vec(),
            bytes_read: acc.len(),
            terminated: acc.is_terminated(),
            timed_out,
        })
    }

    fn read_once(&mut self, acc: &mut FrameAccumulator) -> ClientResult<bool> {
        let mut buf = vec![0u8; acc.remaining()];
        loop {
            match self.stream.read(&mut buf) {
                Ok(n) => {
                    trace!(bytes = n, "single read");
                    acc.extend(&buf[..n]);
                    return Ok(false);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => return Ok(true),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Returns true if the overall receive deadline passed.
    fn read_until_terminator(&mut self, acc: &mut FrameAccumulator) -> ClientResult<bool> {
        // A receive timeout too large to represent means no overall deadline.
        let deadline = Instant::now().checked_add(self.timeouts.receive);
        let mut buf = vec![0u8; acc.remaining().min(READ_CHUNK)];

        while acc.status() == FrameStatus::Pending {
            let left = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => self.timeouts.receive,
            };
            if left.is_zero() {
                return Ok(true);
            }
            self.stream
                .set_read_timeout(Some(left))
                .map_err(|e| ClientError::Socket(format!("failed to set receive timeout: {}", e)))?;

            let want = acc.remaining().min(buf.len());
            match self.stream.read(&mut buf[..want]) {
                Ok(0) => {
                    debug!(bytes = acc.len(), "peer closed before terminator");
                    break;
                }
                Ok(n) => {
                    trace!(bytes = n, "chunk read");
                    acc.extend(&buf[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => return Ok(true),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(false)
    }

    /// Shuts the socket down and releases it.
    pub fn close(self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both)
            && e.kind() != io::ErrorKind::NotConnected
        {
            warn!(endpoint = %self.endpoint, error = %e, "socket shutdown failed");
        }
        debug!(endpoint = %self.endpoint, "connection closed");
    }
}

fn resolve(endpoint: &Endpoint) -> ClientResult<Vec<SocketAddr>> {
    if let Some(ip) = endpoint.literal_ip() {
        return Ok(vec![SocketAddr::new(ip, endpoint.port())]);
    }

    let mut addrs: Vec<SocketAddr> = (endpoint.host(), endpoint.port())
        .to_socket_addrs()
        .map_err(|e| ClientError::Resolution {
            host: endpoint.host().to_string(),
            reason: e.to_string(),
        })?
        .collect();
    addrs.sort_by_key(|a| !a.is_ipv4());

    debug!(host = endpoint.host(), count = addrs.len(), "resolved host");
    Ok(addrs)
}

fn configure(stream: &TcpStream, timeouts: &Timeouts) -> ClientResult<()> {
    stream
        .set_read_timeout(Some(timeouts.receive))
        .map_err(|e| ClientError::Socket(format!("failed to set receive timeout: {}", e)))?;
    stream
        .set_write_timeout(Some(timeouts.send))
        .map_err(|e| ClientError::Socket(format!("failed to set send timeout: {}", e)))?;
    stream
        .set_nodelay(true)
        .map_err(|e| ClientError::Socket(format!("failed to set TCP_NODELAY: {}", e)))?;
    Ok(())
}
