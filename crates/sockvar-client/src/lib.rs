//! Socket client, CLI and test responder front end.
//!
//! This crate provides the `sockvar` command-line interface and the
//! synchronous [`SocketClient`] behind it.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
mod unescape;

pub use cli::Cli;
pub use client::{ClientOptions, Response, SocketClient, execute_with_deadline};
pub use connection::{Connection, ReadMode, Received, Timeouts};
pub use endpoint::Endpoint;
pub use error::{ClientError, ClientResult};
pub use unescape::unescape;
