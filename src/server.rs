//! TCP listener glue
//!
//! Accepts connections and hands each stream, together with the shared
//! registry, to a new `ConnectionSession`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::registry::SessionRegistry;
use crate::session::ConnectionSession;
use crate::types::ConnectionId;

/// Listening chat server
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    config: Config,
}

impl ChatServer {
    /// Bind the listener on `config.bind`
    pub async fn bind(config: Config) -> Result<Self, AppError> {
        let listener = TcpListener::bind(&config.bind).await?;
        Ok(Self {
            listener,
            registry: Arc::new(SessionRegistry::new()),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Accept connections forever
    ///
    /// Accept errors are logged and the loop keeps going.
    pub async fn run(self) {
        info!("Chat server accepting connections");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    match handle_connection(stream, self.registry.clone(), &self.config) {
                        Ok(session) => {
                            tokio::spawn(async move {
                                let id = session.id().clone();
                                session.join().await;
                                info!("Client {} disconnected", id);
                            });
                        }
                        Err(e) => error!("Connection setup error: {}", e),
                    }
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Start a session for an accepted TCP stream
pub fn handle_connection(
    stream: TcpStream,
    registry: Arc<SessionRegistry>,
    config: &Config,
) -> Result<ConnectionSession, AppError> {
    let id = ConnectionId::from_peer(stream.peer_addr()?);
    let (reader, writer) = stream.into_split();
    Ok(ConnectionSession::start(reader, writer, id, registry, config))
}
