//! Error types for the chat server
//!
//! Defines fatal stream errors, recoverable protocol errors and
//! mailbox delivery errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// All variants are fatal for the session that hit them: the reader loop
/// stops and cleanup runs.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the client stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (overlong line or IO)
    #[error("Line codec error: {0}")]
    Lines(#[from] tokio_util::codec::AnyDelimiterCodecError),
}

/// Naming rule violations
///
/// Recoverable: reported back to the offending client only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Name is empty after trimming
    #[error("Name cannot be empty.")]
    Empty,

    /// Name contains whitespace
    #[error("Name cannot contain spaces.")]
    ContainsWhitespace,

    /// Rename target equals the current name
    #[error("You are already using this name.")]
    Unchanged,

    /// Another active session holds the name
    #[error("This name is already taken.")]
    Taken,

    /// Session is not registered (already cleaned up)
    #[error("Session is not registered.")]
    NotRegistered,
}

/// Command syntax errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `#setMyName` without an argument
    #[error("Syntax error: #setMyName <name>")]
    SetMyNameSyntax,

    /// `#sendPrivate` without target or body
    #[error("Syntax error: #sendPrivate <name> <message>")]
    SendPrivateSyntax,

    /// `#sendPrivate` target does not match any active session
    #[error("Client with name '{0}' doesn't exist.")]
    UnknownRecipient(String),
}

/// Mailbox delivery errors
///
/// Never surfaced to clients; the message for that one recipient is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The recipient's mailbox is at capacity
    #[error("Mailbox full")]
    MailboxFull,

    /// The recipient's writer has gone away
    #[error("Mailbox closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_error_text() {
        assert_eq!(NameError::Taken.to_string(), "This name is already taken.");
        assert_eq!(
            NameError::Unchanged.to_string(),
            "You are already using this name."
        );
    }

    #[test]
    fn test_unknown_recipient_text() {
        let err = CommandError::UnknownRecipient("bob".to_string());
        assert_eq!(err.to_string(), "Client with name 'bob' doesn't exist.");
    }
}
