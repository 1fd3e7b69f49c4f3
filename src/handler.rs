//! Reader-side protocol state machine
//!
//! Turns each line read from a client into registry routing calls. It never
//! touches the client stream: every reply goes through a mailbox.

use std::sync::Arc;

use tracing::debug;

use crate::error::{CommandError, NameError};
use crate::message::{validate_name, ClientCommand, ServerNotice};
use crate::registry::SessionRegistry;
use crate::session::SessionHandle;

/// Naming state of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingState {
    /// Every line is an attempt to pick a name
    AwaitingName,
    /// Chatting under the given name; renames stay in this state
    Named(String),
}

/// Per-connection line handler
#[derive(Debug)]
pub struct LineHandler {
    session: SessionHandle,
    registry: Arc<SessionRegistry>,
    state: NamingState,
}

impl LineHandler {
    pub fn new(session: SessionHandle, registry: Arc<SessionRegistry>) -> Self {
        Self {
            session,
            registry,
            state: NamingState::AwaitingName,
        }
    }

    pub fn state(&self) -> &NamingState {
        &self.state
    }

    /// Current name, if one has been set
    pub fn name(&self) -> Option<&str> {
        match &self.state {
            NamingState::AwaitingName => None,
            NamingState::Named(name) => Some(name),
        }
    }

    /// Process one line (terminator already stripped)
    pub fn handle_line(&mut self, line: &str) {
        match &self.state {
            NamingState::AwaitingName => self.choose_name(line),
            NamingState::Named(name) => {
                let name = name.clone();
                self.handle_named(&name, line);
            }
        }
    }

    fn choose_name(&mut self, line: &str) {
        let result = validate_name(line.trim())
            .and_then(|name| self.registry.claim_name(&self.session, name).map(|_| name));

        match result {
            Ok(name) => {
                self.state = NamingState::Named(name.to_string());
                self.reply(ServerNotice::name_set(name));
            }
            Err(err) => self.reply(err.into()),
        }
    }

    fn handle_named(&mut self, name: &str, line: &str) {
        match ClientCommand::parse(line) {
            Ok(ClientCommand::SetMyName(new_name)) => self.rename(name, new_name),
            Ok(ClientCommand::SendPrivate { target, body }) => {
                self.send_private(name, target, body)
            }
            Ok(ClientCommand::Chat(text)) => {
                let notice = ServerNotice::chat(name, text).to_string();
                debug!("{}", notice);
                self.registry.broadcast(&self.session, &notice);
            }
            Err(err) => self.reply(err.into()),
        }
    }

    fn rename(&mut self, current: &str, new_name: &str) {
        let result = validate_name(new_name).and_then(|new_name| {
            if new_name == current {
                return Err(NameError::Unchanged);
            }
            self.registry.claim_name(&self.session, new_name)
        });

        match result {
            Ok(()) => {
                self.state = NamingState::Named(new_name.to_string());
                self.reply(ServerNotice::name_set(new_name));
            }
            Err(err) => self.reply(err.into()),
        }
    }

    fn send_private(&self, name: &str, target: &str, body: &str) {
        let notice = ServerNotice::chat(name, body).to_string();
        debug!("{} (to '{}')", notice, target);
        if !self.registry.unicast_by_name(&notice, target) {
            self.reply(CommandError::UnknownRecipient(target.to_string()).into());
        }
    }

    fn reply(&self, notice: ServerNotice) {
        let line = notice.to_string();
        debug!("Reply to {}: {}", self.session.id, line);
        self.registry.send_to_self(&self.session, &line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{mailbox, Envelope, MailboxReceiver, DEFAULT_MAILBOX_CAPACITY};
    use crate::types::ConnectionId;

    fn connect(registry: &Arc<SessionRegistry>, id: &str) -> (LineHandler, MailboxReceiver) {
        let id = ConnectionId::from(id);
        let (tx, rx) = mailbox(id.clone(), DEFAULT_MAILBOX_CAPACITY);
        let session = SessionHandle::new(id, tx);
        registry.register(&session);
        (LineHandler::new(session, registry.clone()), rx)
    }

    async fn next_line(rx: &mut MailboxReceiver) -> String {
        match rx.recv().await {
            Some(Envelope::Line(line)) => line,
            other => panic!("Expected a line, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_line_sets_name() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");

        a.handle_line("  alice  ");

        assert_eq!(next_line(&mut rx_a).await, "[Info] >> Your name was set to: alice");
        assert_eq!(a.name(), Some("alice"));
        assert!(registry.is_name_taken("alice"));
    }

    #[tokio::test]
    async fn test_invalid_names_keep_awaiting() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");

        a.handle_line("alice smith");
        assert_eq!(next_line(&mut rx_a).await, "[Error] >> Name cannot contain spaces.");

        a.handle_line("   ");
        assert_eq!(next_line(&mut rx_a).await, "[Error] >> Name cannot be empty.");

        assert_eq!(a.state(), &NamingState::AwaitingName);
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");
        let (mut b, mut rx_b) = connect(&registry, "b:2");

        a.handle_line("alice");
        assert_eq!(next_line(&mut rx_a).await, "[Info] >> Your name was set to: alice");

        b.handle_line("alice");
        assert_eq!(next_line(&mut rx_b).await, "[Error] >> This name is already taken.");
        assert_eq!(b.name(), None);
    }

    #[tokio::test]
    async fn test_broadcast_chat() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");
        let (_b, mut rx_b) = connect(&registry, "b:2");

        a.handle_line("A");
        next_line(&mut rx_a).await;

        a.handle_line("hi all");

        // Unnamed sessions receive broadcasts too
        assert_eq!(next_line(&mut rx_b).await, "[A] >> hi all");
        assert!(rx_a.is_empty());
    }

    #[tokio::test]
    async fn test_rename_errors() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");
        let (mut b, mut rx_b) = connect(&registry, "b:2");
        a.handle_line("alice");
        next_line(&mut rx_a).await;
        b.handle_line("bob");
        next_line(&mut rx_b).await;

        a.handle_line("#setMyName");
        assert_eq!(next_line(&mut rx_a).await, "[Error] >> Syntax error: #setMyName <name>");

        a.handle_line("#setMyName al ice");
        assert_eq!(next_line(&mut rx_a).await, "[Error] >> Name cannot contain spaces.");

        a.handle_line("#setMyName alice");
        assert_eq!(next_line(&mut rx_a).await, "[Error] >> You are already using this name.");

        a.handle_line("#setMyName bob");
        assert_eq!(next_line(&mut rx_a).await, "[Error] >> This name is already taken.");

        assert_eq!(a.name(), Some("alice"));
    }

    #[tokio::test]
    async fn test_rename_success() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");
        a.handle_line("alice");
        next_line(&mut rx_a).await;

        a.handle_line("#setMyName alicia");
        assert_eq!(next_line(&mut rx_a).await, "[Info] >> Your name was set to: alicia");
        assert_eq!(a.name(), Some("alicia"));
        assert!(!registry.is_name_taken("alice"));
        assert!(registry.is_name_taken("alicia"));
    }

    #[tokio::test]
    async fn test_send_private() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");
        let (mut b, mut rx_b) = connect(&registry, "b:2");
        let (_c, mut rx_c) = connect(&registry, "c:3");
        a.handle_line("alice");
        next_line(&mut rx_a).await;
        b.handle_line("bob");
        next_line(&mut rx_b).await;

        a.handle_line("#sendPrivate bob hello  there");
        assert_eq!(next_line(&mut rx_b).await, "[alice] >> hello  there");
        assert!(rx_a.is_empty());
        assert!(rx_c.is_empty());
    }

    #[tokio::test]
    async fn test_send_private_errors() {
        let registry = Arc::new(SessionRegistry::new());
        let (mut a, mut rx_a) = connect(&registry, "a:1");
        a.handle_line("alice");
        next_line(&mut rx_a).await;

        a.handle_line("#sendPrivate bob hello");
        assert_eq!(
            next_line(&mut rx_a).await,
            "[Error] >> Client with name 'bob' doesn't exist."
        );

        a.handle_line("#sendPrivate bob");
        assert_eq!(
            next_line(&mut rx_a).await,
            "[Error] >> Syntax error: #sendPrivate <name> <message>"
        );
    }
}
