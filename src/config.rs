//! Server configuration
//!
//! Read from command line flags with environment variable fallbacks.

use clap::Parser;

use crate::mailbox::DEFAULT_MAILBOX_CAPACITY;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default maximum length of one client line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Line-oriented multi-client chat server
#[derive(Debug, Clone, Parser)]
#[command(name = "line_chat", version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "CHAT_BIND", default_value = DEFAULT_ADDR)]
    pub bind: String,

    /// Pending outbound lines kept per client before new ones are dropped
    #[arg(
        long,
        env = "CHAT_MAILBOX_CAPACITY",
        default_value_t = DEFAULT_MAILBOX_CAPACITY,
        value_parser = parse_capacity
    )]
    pub mailbox_capacity: usize,

    /// Longest accepted client line in bytes; longer lines end the session
    #[arg(long, env = "CHAT_MAX_LINE_LENGTH", default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,
}

fn parse_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("capacity must be at least 1".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(e.to_string()),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_ADDR.to_string(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["line_chat"]).unwrap();
        assert_eq!(config.bind, DEFAULT_ADDR);
        assert_eq!(config.mailbox_capacity, 20);
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "line_chat",
            "--bind",
            "0.0.0.0:9000",
            "--mailbox-capacity",
            "5",
        ])
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.mailbox_capacity, 5);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(Config::try_parse_from(["line_chat", "--mailbox-capacity", "0"]).is_err());
    }
}
