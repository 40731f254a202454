//! Request handling: turns a decoded request into a response body.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{Instrument, debug, info_span, warn};

use crate::error::ServerResult;
use crate::socket::Connection;

/// Produces the response body for one decoded request.
///
/// Implemented for any `Fn(&[u8]) -> Vec<u8>` closure.
pub trait Responder: Send + Sync {
    /// Returns the response body for `request`.
    fn respond(&self, request: &[u8]) -> Vec<u8>;
}

impl<F> Responder for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn respond(&self, request: &[u8]) -> Vec<u8> {
        self(request)
    }
}

/// Replies with the same body to every request.
#[derive(Debug, Clone)]
pub struct StaticResponder {
    body: Vec<u8>,
}

impl StaticResponder {
    /// Creates a responder that always answers with `body`.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

impl Responder for StaticResponder {
    fn respond(&self, _request: &[u8]) -> Vec<u8> {
        self.body.clone()
    }
}

/// Replies with the request body unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResponder;

impl Responder for EchoResponder {
    fn respond(&self, request: &[u8]) -> Vec<u8> {
        request.to_vec()
    }
}

/// Runs one exchange on `conn`: read a request, answer it, close.
pub async fn handle_connection(mut conn: Connection, responder: &dyn Responder) -> ServerResult<()> {
    let Some(request) = conn.read_request().await? else {
        debug!("Client closed without sending a request");
        return Ok(());
    };

    debug!(bytes = request.len(), "Request decoded");
    let body = responder.respond(&request);
    conn.write_response(&body).await
}

/// Boxed future returned by [`make_connection_handler`].
pub type ConnectionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Creates a connection handler for [`crate::SocketServer::run`].
///
/// Each connection runs inside its own `connection` span carrying the peer
/// address.
pub fn make_connection_handler(
    responder: Arc<dyn Responder>,
) -> impl Fn(Connection) -> ConnectionFuture + Send + Sync + 'static {
    move |conn| {
        let responder = responder.clone();
        let span = info_span!("connection", peer = %conn.peer_addr());
        Box::pin(
            async move {
                if let Err(e) = handle_connection(conn, responder.as_ref()).await {
                    warn!(error = %e, "Connection handler error");
                }
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_responder_ignores_request() {
        let responder = StaticResponder::new("Result=OK\r\n");
        assert_eq!(responder.respond(b"anything"), b"Result=OK\r\n");
        assert_eq!(responder.respond(b""), b"Result=OK\r\n");
    }

    #[test]
    fn echo_responder_returns_request() {
        assert_eq!(EchoResponder.respond(b"A=1\r\n"), b"A=1\r\n");
    }

    #[test]
    fn closures_are_responders() {
        let upper = |req: &[u8]| req.to_ascii_uppercase();
        let responder: &dyn Responder = &upper;
        assert_eq!(responder.respond(b"result=ok"), b"RESULT=OK");
    }
}
