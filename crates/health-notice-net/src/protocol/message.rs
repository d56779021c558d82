//! Typed messages of the health-notice protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::ClientIdentity;

/// Name of the discriminant field carried by every frame.
pub const TYPE_FIELD: &str = "type";

/// Name of the identity field on handshakes and heartbeat echoes.
pub const CLIENT_ID_FIELD: &str = "clientId";

/// The discriminant of a [`Message`], as it appears in the `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `handshake`
    Handshake,
    /// `heartbeat`
    Heartbeat,
    /// `showNotice`
    ShowNotice,
}

impl MessageKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::Heartbeat => "heartbeat",
            Self::ShowNotice => "showNotice",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a `type` value names no known message kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownKind;

impl FromStr for MessageKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "handshake" => Ok(Self::Handshake),
            "heartbeat" => Ok(Self::Heartbeat),
            "showNotice" => Ok(Self::ShowNotice),
            _ => Err(UnknownKind),
        }
    }
}

/// First frame sent on every connection, announcing this client's identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Identity minted for this connection.
    pub client_id: String,
    /// Unix time in seconds when the handshake was built.
    pub timestamp: i64,
}

impl Handshake {
    /// Build a handshake for `identity`, stamped with the current time.
    pub fn new(identity: &ClientIdentity) -> Self {
        Self {
            client_id: identity.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Liveness check from the server. It is echoed back with `client_id` filled in.
///
/// Any fields the server adds besides `clientId` are kept in `extra` and
/// written back unchanged on the echo. The codec owns the `type` and
/// `clientId` keys: they are never read from or written through `extra`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Heartbeat {
    /// Identity of the replying client. Usually absent on the server's heartbeat.
    pub client_id: Option<String>,
    /// Server-supplied fields carried through the echo.
    pub extra: Map<String, Value>,
}

impl Heartbeat {
    /// Build a heartbeat carrying `extra`, minus the reserved `type` and
    /// `clientId` keys.
    pub fn new(client_id: Option<String>, mut extra: Map<String, Value>) -> Self {
        extra.remove(TYPE_FIELD);
        extra.remove(CLIENT_ID_FIELD);
        Self { client_id, extra }
    }

    /// Turn a received heartbeat into the reply for `identity`.
    pub fn echo_for(mut self, identity: &ClientIdentity) -> Self {
        self.client_id = Some(identity.to_string());
        self
    }
}

/// A notice the server wants shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notice {
    /// Create a notice.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// A decoded protocol frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// `{"type":"handshake","clientId":..,"timestamp":..}`
    Handshake(Handshake),
    /// `{"type":"heartbeat","clientId":..}`
    Heartbeat(Heartbeat),
    /// `{"type":"showNotice","title":..,"message":..}`
    ShowNotice(Notice),
}

impl Message {
    /// The discriminant written to the `type` field.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Handshake(_) => MessageKind::Handshake,
            Self::Heartbeat(_) => MessageKind::Heartbeat,
            Self::ShowNotice(_) => MessageKind::ShowNotice,
        }
    }
}

impl From<Handshake> for Message {
    fn from(m: Handshake) -> Self {
        Self::Handshake(m)
    }
}

impl From<Heartbeat> for Message {
    fn from(m: Heartbeat) -> Self {
        Self::Heartbeat(m)
    }
}

impl From<Notice> for Message {
    fn from(m: Notice) -> Self {
        Self::ShowNotice(m)
    }
}
