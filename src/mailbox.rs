//! Per-session outbound mailbox
//!
//! A bounded FIFO of lines waiting to be written to one client. Any session
//! may enqueue (never blocking); only the owning session's writer dequeues.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::error::DeliveryError;
use crate::types::ConnectionId;

/// Default number of pending lines a mailbox holds
pub const DEFAULT_MAILBOX_CAPACITY: usize = 20;

/// Item carried by a mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// A line to write to the client
    Line(String),
    /// Wakes the writer so it can observe that the reader has finished
    Shutdown,
}

/// Producer side of a session's mailbox
///
/// Cheap to clone; every clone feeds the same queue.
#[derive(Debug, Clone)]
pub struct Mailbox {
    /// Connection id of the owning session, for diagnostics
    owner: ConnectionId,
    sender: mpsc::Sender<Envelope>,
}

/// Consumer side of a session's mailbox, owned by its writer task
#[derive(Debug)]
pub struct MailboxReceiver {
    receiver: mpsc::Receiver<Envelope>,
}

/// Create a bounded mailbox for the session `owner`
///
/// A capacity of zero is bumped to one.
pub fn mailbox(owner: ConnectionId, capacity: usize) -> (Mailbox, MailboxReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (Mailbox { owner, sender }, MailboxReceiver { receiver })
}

impl Mailbox {
    pub fn owner(&self) -> &ConnectionId {
        &self.owner
    }

    /// Enqueue a line without waiting
    ///
    /// Fails immediately if the mailbox is full or its writer is gone.
    pub fn try_deliver(&self, line: String) -> Result<(), DeliveryError> {
        self.sender
            .try_send(Envelope::Line(line))
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::MailboxFull,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Enqueue a line, dropping it with a diagnostic when delivery fails
    ///
    /// Returns whether the line was queued.
    pub fn deliver_or_drop(&self, line: &str) -> bool {
        match self.try_deliver(line.to_string()) {
            Ok(()) => true,
            Err(DeliveryError::MailboxFull) => {
                warn!(
                    "Client {} message queue is full, dropping the message",
                    self.owner
                );
                false
            }
            Err(DeliveryError::Closed) => {
                warn!("Client {} writer is gone, dropping the message", self.owner);
                false
            }
        }
    }

    /// Push the shutdown sentinel
    ///
    /// A full mailbox is fine here: the writer wakes on the next queued line.
    pub fn shutdown(&self) -> Result<(), DeliveryError> {
        self.sender.try_send(Envelope::Shutdown).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::MailboxFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

impl MailboxReceiver {
    /// Wait for the next envelope
    ///
    /// Returns `None` once every producer has been dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }

    /// Whether nothing is queued right now
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
