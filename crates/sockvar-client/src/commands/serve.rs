//! Serve command: runs a test responder in the foreground.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use sockvar_server::{
    EchoResponder, Responder, ServerConfig, SocketServer, StaticResponder,
    make_connection_handler,
};

use crate::cli::ServeArgs;
use crate::error::ClientResult;
use crate::unescape::unescape;

/// Builds the responder selected by `args`.
pub fn responder(args: &ServeArgs) -> Arc<dyn Responder> {
    match args.reply {
        Some(ref reply) => Arc::new(StaticResponder::new(unescape(reply))),
        None => Arc::new(EchoResponder),
    }
}

/// Builds the server configuration from `args`.
pub fn server_config(args: &ServeArgs) -> ServerConfig {
    let mut config = ServerConfig::new(args.listen);
    if let Some(secs) = args.timeout {
        config = config.with_connection_timeout(Duration::from_secs(secs));
    }
    if let Some(max) = args.max_connections {
        config = config.with_max_connections(max);
    }
    config
}

/// Serves until Ctrl-C.
pub async fn run(args: &ServeArgs) -> ClientResult<()> {
    let server = SocketServer::bind(server_config(args)).await?;
    let mode = if args.reply.is_some() { "static" } else { "echo" };
    info!(addr = %server.local_addr()?, mode, "Responder ready");

    let handler = make_connection_handler(responder(args));
    server
        .run_until_shutdown(handler, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Responder stopped");
    Ok(())
}
