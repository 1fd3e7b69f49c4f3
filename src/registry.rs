//! Shared session registry
//!
//! The registry is the single source of truth for which sessions are active,
//! which names are in use, and where routed messages go.
//!
//! # Locking
//! One `RwLock` guards the whole set. `register`, `unregister` and
//! `claim_name` take the write lock; routing and lookups take the read lock,
//! so a routing call sees every session either fully registered or not at all.
//! Mailbox traffic itself never needs this lock.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::NameError;
use crate::mailbox::Mailbox;
use crate::session::SessionHandle;
use crate::types::{ConnectionId, SessionKey};

/// Registry view of one active session
#[derive(Debug)]
struct Entry {
    id: ConnectionId,
    /// None until the client picks a name
    name: Option<String>,
    mailbox: Mailbox,
}

/// Process-wide directory of active sessions
///
/// Shared as `Arc<SessionRegistry>`; every method is safe to call from any task.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionKey, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to the active set
    ///
    /// Returns false if it was already registered.
    pub fn register(&self, session: &SessionHandle) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.key) {
            return false;
        }
        sessions.insert(
            session.key,
            Entry {
                id: session.id.clone(),
                name: None,
                mailbox: session.mailbox.clone(),
            },
        );
        info!("Client {} registered", session.id);
        debug!("Active sessions: {}", sessions.len());
        true
    }

    /// Remove a session from the active set
    ///
    /// Returns whether it was present.
    pub fn unregister(&self, session: &SessionHandle) -> bool {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(&session.key).is_some();
        if removed {
            info!("Client {} unregistered", session.id);
            debug!("Active sessions: {}", sessions.len());
        }
        removed
    }

    /// Check whether any active session currently uses `name` (case-sensitive)
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.sessions
            .read()
            .values()
            .any(|entry| entry.name.as_deref() == Some(name))
    }

    /// Assign `name` to `session` if no other active session holds it
    ///
    /// The check and the assignment happen under one write lock, so of two
    /// sessions racing for the same name exactly one wins.
    pub fn claim_name(&self, session: &SessionHandle, name: &str) -> Result<(), NameError> {
        let mut sessions = self.sessions.write();

        let taken = sessions
            .iter()
            .any(|(key, entry)| *key != session.key && entry.name.as_deref() == Some(name));
        if taken {
            return Err(NameError::Taken);
        }

        let entry = sessions
            .get_mut(&session.key)
            .ok_or(NameError::NotRegistered)?;
        if entry.name.as_deref() == Some(name) {
            return Err(NameError::Unchanged);
        }
        entry.name = Some(name.to_string());
        info!("Client {} set name to '{}'", entry.id, name);
        Ok(())
    }

    /// Deliver `message` to every active session except `sender`
    ///
    /// A full mailbox only loses this message for that one recipient.
    /// Returns the number of mailboxes the message was queued in.
    pub fn broadcast(&self, sender: &SessionHandle, message: &str) -> usize {
        let sessions = self.sessions.read();
        let mut delivered = 0;
        for (key, entry) in sessions.iter() {
            if *key != sender.key && entry.mailbox.deliver_or_drop(message) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Deliver `message` to the first active session named `name`
    ///
    /// Returns false, sending nothing, when no session has that name. A
    /// match whose mailbox is full still counts as found.
    pub fn unicast_by_name(&self, message: &str, name: &str) -> bool {
        let sessions = self.sessions.read();
        match sessions
            .values()
            .find(|entry| entry.name.as_deref() == Some(name))
        {
            Some(entry) => {
                entry.mailbox.deliver_or_drop(message);
                true
            }
            None => false,
        }
    }

    /// Deliver a reply to `sender`'s own mailbox
    ///
    /// Works whether or not the sender is registered.
    pub fn send_to_self(&self, sender: &SessionHandle, message: &str) {
        sender.mailbox.deliver_or_drop(message);
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Snapshot of the names currently in use
    pub fn names(&self) -> Vec<String> {
        self.sessions
            .read()
            .values()
            .filter_map(|entry| entry.name.clone())
            .collect()
    }
}
