//! Wire protocol: typed messages and their JSON framing.
//!
//! ```ignore
//! use health_notice_net::protocol::{codec, Message, Notice};
//!
//! let frame = codec::encode_text(&Message::ShowNotice(Notice::new("Backup", "done")))?;
//! assert_eq!(frame, r#"{"message":"done","title":"Backup","type":"showNotice"}"#);
//! ```

pub mod codec;
mod message;

pub use codec::{decode, decode_str, encode, encode_text};
pub use message::{
    CLIENT_ID_FIELD, Handshake, Heartbeat, Message, MessageKind, Notice, TYPE_FIELD, UnknownKind,
};
