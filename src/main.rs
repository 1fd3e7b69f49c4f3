//! Line-Oriented Chat Server - Entry Point
//!
//! Parses configuration, binds the TCP listener and accepts connections.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat::{ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = Config::parse();

    let server = ChatServer::bind(config.clone()).await?;
    info!("Chat server listening on {}", server.local_addr()?);
    info!(
        "Mailbox capacity {}, max line length {}",
        config.mailbox_capacity, config.max_line_length
    );

    server.run().await;

    Ok(())
}
