//! Client for the health-notice WebSocket protocol.
//!
//! A long-running [`NoticeSession`] keeps one connection to a health endpoint
//! alive. On each connection it announces itself with a handshake carrying a
//! fresh [`ClientIdentity`], answers every server heartbeat with an echo that
//! carries that identity, and hands `showNotice` frames to a
//! [`NotificationSink`]. Lost connections are retried with exponential backoff
//! until the session is closed.
//!
//! # Wire format
//!
//! Every frame is one JSON object with a string `type` discriminant:
//!
//! | `type`       | direction        | fields                      |
//! |--------------|------------------|-----------------------------|
//! | `handshake`  | client to server | `clientId`, `timestamp`     |
//! | `heartbeat`  | both             | `clientId` on the echo      |
//! | `showNotice` | server to client | `title`, `message`          |
//!
//! Unknown types are ignored. Malformed frames are logged and dropped without
//! affecting the connection.
//!
//! # Example
//!
//! ```ignore
//! use health_notice_net::{NoticeSession, SessionConfig, SinkError};
//!
//! let sink = |title: &str, message: &str| -> Result<(), SinkError> {
//!     println!("{title}: {message}");
//!     Ok(())
//! };
//!
//! let session = NoticeSession::new(SessionConfig::default(), sink);
//! session.connect()?;
//!
//! tokio::signal::ctrl_c().await?;
//! session.shutdown().await;
//! ```

mod error;
pub mod identity;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod sink;

pub use error::{DecodeError, EncodeError, Result, SessionError};
pub use identity::ClientIdentity;

// Re-export commonly used types at the crate root
pub use protocol::{Message, Notice};
pub use session::{
    DEFAULT_ENDPOINT, NoticeSession, ReconnectConfig, SessionConfig, SessionEvent, SessionState,
};
pub use sink::{DispatchError, NoticeDispatcher, NotificationSink, SinkError, TracingSink};
