//! TCP listener speaking the terminator-framed Base64 protocol.
//!
//! Each accepted connection carries exactly one exchange: read one request
//! frame, write one response frame, close.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace};

use sockvar_protocol::{FrameAccumulator, FrameStatus, ProtocolError, deframe, frame};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Size of each socket read.
const READ_CHUNK: usize = 1024;

/// TCP server for handling client connections.
pub struct SocketServer {
    /// Server configuration.
    config: ServerConfig,
    /// TCP listener.
    listener: TcpListener,
    /// Semaphore for limiting concurrent connections.
    connection_semaphore: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds to the configured listen address.
    ///
    /// Port 0 picks a free port; use [`SocketServer::local_addr`] to find it.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        if config.max_connections == 0 {
            return Err(ServerError::config("max_connections must be at least 1"));
        }

        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|e| ServerError::bind(config.listen_addr, e))?;

        info!(
            addr = %listener.local_addr()?,
            "Socket server listening"
        );

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the address the server is bound to.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts a single connection.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self
            .connection_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServerError::config("connection semaphore closed"))?;

        let (stream, peer) = self.listener.accept().await?;
        debug!(peer = %peer, "Accepted new connection");

        Ok(Connection {
            stream,
            peer,
            timeout: self.config.connection_timeout,
            max_request_size: self.config.max_request_size,
            _permit: permit,
        })
    }

    /// Runs the server accept loop, calling the handler for each connection.
    ///
    /// This method runs indefinitely; accept errors are logged and skipped.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(connection) => {
                    tokio::spawn(handler(connection));
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Runs the server accept loop until `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
        S: std::future::Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

/// A client connection to the server.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    timeout: Duration,
    max_request_size: usize,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl Connection {
    /// Returns the remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Reads one request frame and returns the decoded payload.
    ///
    /// Reading stops at the terminator. A peer that closes without sending a
    /// terminator has whatever it sent decoded as-is. Returns `Ok(None)` if
    /// the connection closed before any bytes arrived.
    pub async fn read_request(&mut self) -> ServerResult<Option<Vec<u8>>> {
        let mut acc = FrameAccumulator::with_capacity(self.max_request_size);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = match tokio::time::timeout(self.timeout, self.stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(ServerError::Protocol(ProtocolError::Timeout {
                        operation: "read request".to_string(),
                    }));
                }
            };

            if n == 0 {
                if acc.is_empty() {
                    return Ok(None);
                }
                debug!(bytes = acc.len(), "Peer closed before terminator");
                break;
            }

            let received = acc.len() + n;
            match acc.extend(&chunk[..n]) {
                FrameStatus::Pending => continue,
                FrameStatus::Terminated => break,
                FrameStatus::Full => {
                    return Err(ServerError::Protocol(ProtocolError::FrameTooLarge {
                        size: received,
                        max: self.max_request_size,
                    }));
                }
            }
        }

        trace!(raw = %String::from_utf8_lossy(acc.body()), "Request frame");
        Ok(Some(deframe(acc.body())))
    }

    /// Frames and writes a response, then shuts down the write half.
    pub async fn write_response(&mut self, payload: &[u8]) -> ServerResult<()> {
        let data = frame(payload)?;

        let write = async {
            self.stream.write_all(&data).await?;
            self.stream.flush().await?;
            self.stream.shutdown().await
        };

        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ServerError::Protocol(ProtocolError::Timeout {
                    operation: "write response".to_string(),
                }));
            }
        }

        debug!(bytes = data.len(), "Response written");
        Ok(())
    }
}
