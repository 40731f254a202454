//! One request/response exchange, start to finish.
//!
//! [`SocketClient::execute`] runs the stages in a fixed order:
//!
//! 1. validate host, port and message
//! 2. connect with the connect timeout
//! 3. unescape the message
//! 4. frame and send with the send timeout
//! 5. receive into a bounded buffer with the receive timeout
//! 6. close the connection (single release point, also on failure)
//! 7. decode the Base64 body
//! 8. parse key/value pairs
//!
//! Binding the pairs to a [`VariableSink`] is the last step and is left to
//! [`SocketClient::execute_into`] or the caller.

use std::io;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace, warn};

use sockvar_core::{DEFAULT_COUNT_VARIABLE, VariableEntry, VariableSink, bind_entries};
use sockvar_protocol::{deframe, parse_response};

use crate::connection::{Connection, ReadMode, Received, Timeouts};
use crate::endpoint::Endpoint;
use crate::error::{ClientError, ClientResult};
use crate::unescape::unescape;

/// Default receive buffer size in bytes.
pub const DEFAULT_RECEIVE_CAPACITY: usize = 4096;

/// Options for a [`SocketClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Connect, send and receive timeouts.
    pub timeouts: Timeouts,
    /// Upper bound on bytes read for one response.
    pub receive_capacity: usize,
    /// How the response is read.
    pub read_mode: ReadMode,
    /// Turn a receive timeout into an error instead of a partial response.
    pub strict_timeouts: bool,
    /// Variable receiving the number of bound entries.
    pub count_variable: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            receive_capacity: DEFAULT_RECEIVE_CAPACITY,
            read_mode: ReadMode::default(),
            strict_timeouts: false,
            count_variable: DEFAULT_COUNT_VARIABLE.to_string(),
        }
    }
}

impl ClientOptions {
    /// Sets all timeouts.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the receive capacity.
    pub fn with_receive_capacity(mut self, capacity: usize) -> Self {
        self.receive_capacity = capacity;
        self
    }

    /// Sets the read mode.
    pub fn with_read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// Enables or disables strict receive timeouts.
    pub fn with_strict_timeouts(mut self, strict: bool) -> Self {
        self.strict_timeouts = strict;
        self
    }

    /// Sets the count variable name.
    pub fn with_count_variable(mut self, name: impl Into<String>) -> Self {
        self.count_variable = name.into();
        self
    }

    /// Checks the options for values the socket layer cannot honour.
    pub fn validate(&self) -> ClientResult<()> {
        self.timeouts.validate()?;
        if self.receive_capacity == 0 {
            return Err(ClientError::validation(
                "receive buffer must be at least one byte",
            ));
        }
        if self.count_variable.trim().is_empty() {
            return Err(ClientError::validation("count variable must not be empty"));
        }
        Ok(())
    }
}

/// Result of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// Parsed pairs in wire order.
    pub entries: Vec<VariableEntry>,
    /// Bytes read from the socket, terminator included.
    pub bytes_received: usize,
    /// True if the response terminator was seen.
    pub terminated: bool,
    /// True if the receive timeout expired before the response was complete.
    pub timed_out: bool,
}

impl Response {
    /// Returns true if the response may be incomplete.
    pub fn truncated(&self) -> bool {
        !self.terminated
    }

    /// Binds every entry and the count variable to `sink`.
    pub fn bind_into<S>(&self, sink: &mut S, count_variable: &str) -> usize
    where
        S: VariableSink + ?Sized,
    {
        bind_entries(sink, &self.entries, count_variable)
    }
}

/// Synchronous client that performs one exchange per call.
///
/// Each call opens its own connection, so a client can be shared between
/// threads.
#[derive(Debug, Clone, Default)]
pub struct SocketClient {
    options: ClientOptions,
}

impl SocketClient {
    /// Creates a client with the given options.
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    /// Returns the client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends `message` to `host:port` and returns the parsed response.
    ///
    /// `message` may carry backslash escapes; see [`crate::unescape()`].
    pub fn execute(&self, host: &str, port: &str, message: &str) -> ClientResult<Response> {
        let endpoint = Endpoint::parse(host, port)?;
        if message.is_empty() {
            return Err(ClientError::validation("message must not be empty"));
        }
        self.options.validate()?;

        debug!(endpoint = %endpoint, "connecting");
        let conn = Connection::open(&endpoint, &self.options.timeouts)?;

        let payload = unescape(message);
        trace!(payload = %String::from_utf8_lossy(&payload), "unescaped message");

        self.finish(conn, &payload)
    }

    /// Like [`SocketClient::execute`], then binds the entries to `sink`.
    pub fn execute_into<S>(
        &self,
        host: &str,
        port: &str,
        message: &str,
        sink: &mut S,
    ) -> ClientResult<Response>
    where
        S: VariableSink + ?Sized,
    {
        let response = self.execute(host, port, message)?;
        let count = response.bind_into(sink, &self.options.count_variable);
        debug!(count, variable = %self.options.count_variable, "variables bound");
        Ok(response)
    }

    /// Sends raw `payload` bytes (no unescaping) to `endpoint`.
    pub fn send(&self, endpoint: &Endpoint, payload: &[u8]) -> ClientResult<Response> {
        if payload.is_empty() {
            return Err(ClientError::validation("message must not be empty"));
        }
        self.options.validate()?;

        debug!(endpoint = %endpoint, "connecting");
        let conn = Connection::open(endpoint, &self.options.timeouts)?;
        self.finish(conn, payload)
    }

    fn finish(&self, mut conn: Connection, payload: &[u8]) -> ClientResult<Response> {
        let received = self.exchange(&mut conn, payload);
        conn.close();
        let received = received?;

        if received.timed_out {
            if self.options.strict_timeouts {
                return Err(ClientError::timeout("receive"));
            }
            warn!(
                bytes = received.bytes_read,
                "receive timed out, using partial response"
            );
        } else if !received.terminated {
            debug!(bytes = received.bytes_read, "response has no terminator");
        }

        let body = deframe(&received.body);
        let entries = parse_response(&body);
        debug!(count = entries.len(), "response parsed");
        for entry in &entries {
            trace!(key = %entry.key, value = %entry.value, "variable");
        }

        Ok(Response {
            entries,
            bytes_received: received.bytes_read,
            terminated: received.terminated,
            timed_out: received.timed_out,
        })
    }

    fn exchange(&self, conn: &mut Connection, payload: &[u8]) -> ClientResult<Received> {
        let sent = conn.send(payload)?;
        debug!(bytes = sent, "request sent");

        let received = conn.receive(self.options.receive_capacity, self.options.read_mode)?;
        debug!(
            bytes = received.bytes_read,
            terminated = received.terminated,
            timed_out = received.timed_out,
            "response received"
        );
        Ok(received)
    }
}

/// Runs [`SocketClient::execute`] on the blocking pool, bounded by `deadline`.
///
/// The deadline covers name resolution too, which the socket timeouts do
/// not. A call that misses the deadline keeps running in the background
/// until its own timeouts fire; its result is discarded.
pub async fn execute_with_deadline(
    client: SocketClient,
    host: String,
    port: String,
    message: String,
    deadline: Duration,
) -> ClientResult<Response> {
    let task = tokio::task::spawn_blocking(move || client.execute(&host, &port, &message));

    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ClientError::Io(io::Error::other(format!(
            "client task failed: {}",
            e
        )))),
        Err(_) => Err(ClientError::timeout("call")),
    }
}
