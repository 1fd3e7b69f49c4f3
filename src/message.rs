//! Line protocol definitions
//!
//! Client lines are parsed into `ClientCommand`; everything the server
//! sends back is a `ServerNotice` rendered through `Display`.

use crate::error::{CommandError, NameError};
use crate::types::ConnectionId;

/// Rename command prefix
pub const SET_MY_NAME: &str = "#setMyName";

/// Private message command prefix
pub const SEND_PRIVATE: &str = "#sendPrivate";

/// Prompt written right after the greeting
pub const NAME_PROMPT: &str = "Enter your name:\n";

/// Greeting written as the very first bytes of a connection
pub fn greeting(id: &ConnectionId) -> String {
    format!("\nYou are connected from {}\n", id)
}

/// Client → Server line, once the client has a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand<'a> {
    /// `#setMyName <newName>`; the argument is not validated yet
    SetMyName(&'a str),
    /// `#sendPrivate <name> <message...>`
    SendPrivate { target: &'a str, body: &'a str },
    /// Any other line, broadcast verbatim
    Chat(&'a str),
}

impl<'a> ClientCommand<'a> {
    /// Parse one line received from a named client
    ///
    /// Command prefixes are case-sensitive. Arguments are split on single
    /// spaces after trimming the line, so the private message body keeps
    /// its inner spacing.
    pub fn parse(line: &'a str) -> Result<Self, CommandError> {
        if line.starts_with(SET_MY_NAME) {
            let mut args = line.trim().splitn(2, ' ');
            args.next();
            return match args.next() {
                Some(name) => Ok(ClientCommand::SetMyName(name)),
                None => Err(CommandError::SetMyNameSyntax),
            };
        }

        if line.starts_with(SEND_PRIVATE) {
            let mut args = line.trim().splitn(3, ' ');
            args.next();
            return match (args.next(), args.next()) {
                (Some(target), Some(body)) => Ok(ClientCommand::SendPrivate { target, body }),
                _ => Err(CommandError::SendPrivateSyntax),
            };
        }

        Ok(ClientCommand::Chat(line))
    }
}

/// Check a candidate name against the naming rules
pub fn validate_name(name: &str) -> Result<&str, NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(NameError::ContainsWhitespace);
    }
    Ok(name)
}

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerNotice {
    /// Informational confirmation, `[Info] >> ...`
    Info(String),
    /// Protocol error reported to the offending client, `[Error] >> ...`
    Error(String),
    /// Chat line from a named client, `[<from>] >> ...`
    Chat { from: String, body: String },
}

impl ServerNotice {
    /// Confirmation sent after a successful name change
    pub fn name_set(name: &str) -> Self {
        ServerNotice::Info(format!("Your name was set to: {}", name))
    }

    pub fn chat(from: &str, body: &str) -> Self {
        ServerNotice::Chat {
            from: from.to_string(),
            body: body.to_string(),
        }
    }
}

impl std::fmt::Display for ServerNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerNotice::Info(text) => write!(f, "[Info] >> {}", text),
            ServerNotice::Error(text) => write!(f, "[Error] >> {}", text),
            ServerNotice::Chat { from, body } => write!(f, "[{}] >> {}", from, body),
        }
    }
}

/// Convert NameError to ServerNotice for client notification
impl From<NameError> for ServerNotice {
    fn from(err: NameError) -> Self {
        ServerNotice::Error(err.to_string())
    }
}

/// Convert CommandError to ServerNotice for client notification
impl From<CommandError> for ServerNotice {
    fn from(err: CommandError) -> Self {
        ServerNotice::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat() {
        assert_eq!(
            ClientCommand::parse("hi all").unwrap(),
            ClientCommand::Chat("hi all")
        );
    }

    #[test]
    fn test_parse_set_my_name() {
        assert_eq!(
            ClientCommand::parse("#setMyName bob").unwrap(),
            ClientCommand::SetMyName("bob")
        );
        assert_eq!(
            ClientCommand::parse("#setMyName   ").unwrap_err(),
            CommandError::SetMyNameSyntax
        );
    }

    #[test]
    fn test_parse_set_my_name_keeps_extra_words() {
        // Validation rejects the whitespace later
        assert_eq!(
            ClientCommand::parse("#setMyName bob smith").unwrap(),
            ClientCommand::SetMyName("bob smith")
        );
    }

    #[test]
    fn test_parse_send_private() {
        assert_eq!(
            ClientCommand::parse("#sendPrivate bob hello there").unwrap(),
            ClientCommand::SendPrivate {
                target: "bob",
                body: "hello there"
            }
        );
    }

    #[test]
    fn test_parse_send_private_syntax() {
        assert_eq!(
            ClientCommand::parse("#sendPrivate bob").unwrap_err(),
            CommandError::SendPrivateSyntax
        );
        assert_eq!(
            ClientCommand::parse("#sendPrivate").unwrap_err(),
            CommandError::SendPrivateSyntax
        );
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        assert_eq!(
            ClientCommand::parse("#setmyname bob").unwrap(),
            ClientCommand::Chat("#setmyname bob")
        );
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("alice"), Ok("alice"));
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(validate_name("a b"), Err(NameError::ContainsWhitespace));
        assert_eq!(validate_name("a\tb"), Err(NameError::ContainsWhitespace));
    }

    #[test]
    fn test_notice_format() {
        assert_eq!(
            ServerNotice::name_set("alice").to_string(),
            "[Info] >> Your name was set to: alice"
        );
        assert_eq!(
            ServerNotice::from(NameError::Taken).to_string(),
            "[Error] >> This name is already taken."
        );
        assert_eq!(ServerNotice::chat("A", "hi all").to_string(), "[A] >> hi all");
    }

    #[test]
    fn test_greeting() {
        let id = ConnectionId::from("127.0.0.1:5000");
        assert_eq!(greeting(&id), "\nYou are connected from 127.0.0.1:5000\n");
    }
}
