//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;
use crate::connection::ReadMode;

/// sockvar - send a Base64 message over TCP and bind the key/value reply
#[derive(Debug, Parser)]
#[command(name = "sockvar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SOCKVAR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a message and print the variables from the reply
    Send(SendArgs),

    /// Run a test responder in the foreground
    Serve(ServeArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `sockvar send`.
#[derive(Debug, Clone, Args)]
pub struct SendArgs {
    /// Server host name or IP address
    pub host: String,

    /// Server port
    pub port: String,

    /// Message to send; `\r`, `\n`, `\t`, `\b` and `\f` escapes are expanded
    pub message: String,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Shorthand for `--format json`
    #[arg(long, conflicts_with = "format")]
    pub json: bool,

    /// How the reply is read
    #[arg(long, value_enum)]
    pub read_mode: Option<ReadMode>,

    /// Connect, send and receive timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Receive buffer size in bytes
    #[arg(long)]
    pub receive_buffer: Option<usize>,

    /// Fail if the receive timeout expires
    #[arg(long)]
    pub strict: bool,

    /// Bound on the whole call in seconds, name resolution included
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Variable that receives the number of pairs
    #[arg(long)]
    pub count_variable: Option<String>,
}

impl SendArgs {
    /// Returns the output format chosen on the command line, if any.
    pub fn output_format(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else {
            self.format
        }
    }
}

/// Arguments for `sockvar serve`.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, short, default_value_t = sockvar_server::default_listen_addr())]
    pub listen: SocketAddr,

    /// Reply with this text (escapes expanded) instead of echoing
    #[arg(long)]
    pub reply: Option<String>,

    /// Echo each request back (the default)
    #[arg(long, conflicts_with = "reply")]
    pub echo: bool,

    /// Per-connection timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum concurrent connections
    #[arg(long)]
    pub max_connections: Option<usize>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
