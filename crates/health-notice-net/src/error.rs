//! Error types for the session and wire protocol.

use tokio_tungstenite::tungstenite;

/// Errors surfaced by [`NoticeSession`](crate::session::NoticeSession) and its configuration.
///
/// Inside the session task these are logged and reported as
/// [`SessionEvent::Error`](crate::session::SessionEvent::Error); only caller-side
/// operations (sending, building the upgrade request) return them directly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The endpoint is not a usable WebSocket URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// A handshake header name or value was rejected.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// Connection refused, reset, or a protocol-level failure on the socket.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The connect attempt did not complete in time.
    #[error("Connection attempt timed out")]
    Timeout,
    /// No connection is currently open.
    #[error("Not connected")]
    NotConnected,
    /// The reconnect budget was used up.
    #[error("Max reconnection attempts ({0}) reached")]
    ReconnectExhausted(u32),
    /// An outbound message could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<tungstenite::Error> for SessionError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Url(e) => Self::InvalidUrl(e.to_string()),
            tungstenite::Error::HttpFormat(e) => Self::InvalidUrl(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<url::ParseError> for SessionError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for SessionError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for SessionError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// Why an inbound frame could not be turned into a [`Message`](crate::protocol::Message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Invalid JSON, invalid UTF-8, a non-object payload, or fields of the wrong shape.
    #[error("Malformed frame: {0}")]
    Malformed(String),
    /// The `type` field is missing, not a string, or not a known message type.
    #[error("Unknown message type: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnknownType(Option<String>),
}

impl DecodeError {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }

    /// Whether the frame should be silently ignored rather than reported.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

/// Failure to serialize an outbound message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to encode message: {0}")]
pub struct EncodeError(pub(crate) String);

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// A specialized Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
