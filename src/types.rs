//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: `"<address>:<port>"` string shown to the client and in logs
//! - `SessionKey`: UUID-based identity used by the registry

use std::net::SocketAddr;

use uuid::Uuid;

/// Connection identifier (`"<address>:<port>"`)
///
/// Assigned once when the connection is accepted and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Build the identifier from a remote peer address
    pub fn from_peer(addr: SocketAddr) -> Self {
        Self(format!("{}:{}", addr.ip(), addr.port()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique session identity (newtype pattern)
///
/// Two sessions are distinct registry members even when their connection ids
/// or names happen to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(pub Uuid);

impl SessionKey {
    /// Create a new random session key
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_unique() {
        let key1 = SessionKey::new();
        let key2 = SessionKey::new();
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_connection_id_from_peer() {
        let addr: SocketAddr = "192.168.1.7:51234".parse().unwrap();
        let id = ConnectionId::from_peer(addr);
        assert_eq!(id.as_str(), "192.168.1.7:51234");
    }

    #[test]
    fn test_connection_id_ipv6() {
        let addr: SocketAddr = "[::1]:4000".parse().unwrap();
        assert_eq!(ConnectionId::from_peer(addr).to_string(), "::1:4000");
    }
}
