//! Session state and lifecycle events.

use std::time::Duration;

use crate::error::SessionError;

/// Current state of a notice session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connection, and none being attempted.
    #[default]
    Disconnected,
    /// Dialing the endpoint.
    Connecting,
    /// Handshake sent; frames are being exchanged.
    Open,
    /// An explicit close is in progress.
    Closing,
    /// Waiting out the backoff delay before the next connect attempt.
    ReconnectPending,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closing => write!(f, "Closing"),
            Self::ReconnectPending => write!(f, "ReconnectPending"),
        }
    }
}

/// Lifecycle notifications published by a session.
///
/// Delivered through a broadcast channel; slow subscribers may observe
/// `RecvError::Lagged` and miss events.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// The handshake for a new connection was written.
    HandshakeSent {
        /// Identity announced in the handshake.
        client_id: String,
    },
    /// A pong arrived.
    Pong {
        /// Time since the most recent ping, if one was sent on this connection.
        elapsed: Option<Duration>,
        /// Payload echoed by the peer.
        payload: Vec<u8>,
    },
    /// A transport or reconnect error was recorded.
    Error(SessionError),
}
