//! Per-connection client identity.

use std::fmt;

use uuid::Uuid;

/// Opaque token identifying this client to the server for one connection.
///
/// A fresh identity is minted every time a connection opens and is dropped
/// when that connection ends; nothing survives a reconnect or a restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientIdentity(Uuid);

impl ClientIdentity {
    /// Mint a new random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_unique() {
        let a = ClientIdentity::new();
        let b = ClientIdentity::new();
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_display_is_hyphenated_uuid() {
        let id = ClientIdentity::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(Uuid::parse_str(&text).ok(), Some(*id.as_uuid()));
    }
}
