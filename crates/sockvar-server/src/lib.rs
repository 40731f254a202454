//! Line-service responder for the sockvar wire protocol.
//!
//! Listens on TCP, reads one Base64 frame per connection, passes the decoded
//! request to a [`Responder`] and writes the framed answer before closing.
//! Used for local testing of `sockvar send` and for the end-to-end tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sockvar_server::{ServerConfig, SocketServer, StaticResponder, make_connection_handler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = SocketServer::bind(ServerConfig::default()).await?;
//!     let handler = make_connection_handler(Arc::new(StaticResponder::new("Result=OK\r\n")));
//!     server.run_until_shutdown(handler, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod socket;

pub use config::{DEFAULT_PORT, ServerConfig, default_listen_addr};
pub use error::{ServerError, ServerResult};
pub use handler::{
    ConnectionFuture, EchoResponder, Responder, StaticResponder, handle_connection,
    make_connection_handler,
};
pub use socket::{Connection, SocketServer};
