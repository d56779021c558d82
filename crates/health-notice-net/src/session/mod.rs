//! Reconnecting notice session.
//!
//! This module provides the client side of the health-notice protocol:
//! - A fresh client identity and handshake on every connection
//! - Heartbeat echo, in receipt order
//! - `showNotice` delivery through a bounded queue to a [`NotificationSink`](crate::NotificationSink)
//! - Automatic reconnect with exponential backoff and jitter
//! - Optional keep-alive pings
//! - Lifecycle events over a broadcast channel
//!
//! # Example
//!
//! ```ignore
//! use health_notice_net::session::{NoticeSession, ReconnectConfig, SessionConfig};
//! use health_notice_net::TracingSink;
//!
//! let config = SessionConfig::new("ws://localhost:8080/ws/health")
//!     .header("Authorization", "Bearer token")
//!     .reconnect_config(ReconnectConfig::new().max_attempts(10));
//!
//! let session = NoticeSession::new(config, TracingSink);
//! session.connect()?;
//! // ...
//! session.shutdown().await;
//! ```

mod client;
pub mod config;
pub mod dispatch;
mod state;

pub use client::NoticeSession;
pub use config::{DEFAULT_ENDPOINT, ReconnectConfig, SessionConfig};
pub use dispatch::{FrameAction, dispatch_frame};
pub use state::{SessionEvent, SessionState};
