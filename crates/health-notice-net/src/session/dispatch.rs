//! Per-frame dispatch rules for an open connection.
//!
//! Kept free of I/O so the rules can be checked without a socket. The session
//! loop only calls this while `Open`; it never reads frames in any other state.

use crate::error::DecodeError;
use crate::identity::ClientIdentity;
use crate::protocol::{self, Message, MessageKind, Notice};

/// What the session should do with one inbound frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameAction {
    /// Write this message back before reading the next frame.
    Reply(Message),
    /// Hand this notice to the sink.
    Notify(Notice),
    /// Nothing to do. Carries the type name when one was present.
    Ignore(Option<String>),
    /// The frame could not be decoded and is dropped.
    Drop(DecodeError),
}

/// Decide how to handle `payload` on a connection identified by `identity`.
pub fn dispatch_frame(payload: &[u8], identity: &ClientIdentity) -> FrameAction {
    match protocol::decode(payload) {
        Ok(Message::Heartbeat(heartbeat)) => {
            FrameAction::Reply(Message::Heartbeat(heartbeat.echo_for(identity)))
        }
        Ok(Message::ShowNotice(notice)) => FrameAction::Notify(notice),
        // The server has no reason to send a handshake; tolerate it.
        Ok(Message::Handshake(_)) => {
            FrameAction::Ignore(Some(MessageKind::Handshake.as_str().to_string()))
        }
        Err(DecodeError::UnknownType(kind)) => FrameAction::Ignore(kind),
        Err(err) => FrameAction::Drop(err),
    }
}
