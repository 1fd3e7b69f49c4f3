//! Line-Oriented Multi-Client Chat Server Library
//!
//! Clients connect over TCP, pick a unique name, and exchange broadcast or
//! private text lines.
//!
//! # Features
//! - Unique, whitespace-free names, checked and assigned atomically
//! - Renaming with `#setMyName <name>`
//! - Private messages with `#sendPrivate <name> <message>`
//! - Broadcast of every other line to all other clients
//! - Bounded per-client mailboxes with drop-on-full delivery
//!
//! # Architecture
//! - `SessionRegistry` is the shared directory of active sessions, guarded
//!   by one lock, and routes messages into mailboxes
//! - Each connection is a `ConnectionSession` with a reader task (protocol)
//!   and a writer task (the only one writing to the socket)
//! - Mailboxes are bounded `mpsc` channels; producers never block
//!
//! # Example
//! ```ignore
//! use line_chat::{ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind(Config::default()).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod mailbox;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::{AppError, CommandError, DeliveryError, NameError};
pub use handler::{LineHandler, NamingState};
pub use mailbox::{mailbox, Envelope, Mailbox, MailboxReceiver};
pub use message::{ClientCommand, ServerNotice};
pub use registry::SessionRegistry;
pub use server::{handle_connection, ChatServer};
pub use session::{ConnectionSession, SessionHandle};
pub use types::{ConnectionId, SessionKey};
