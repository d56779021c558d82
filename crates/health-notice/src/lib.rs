//! Health-notice desktop client.
//!
//! Re-exports the session library and adds the pieces a desktop process needs:
//!
//! - [`desktop::DesktopSink`]: shows notices as system notifications (feature `desktop`)
//! - [`sink_from_env`]: picks the sink the `health-notice` binary uses
//!
//! # Example
//!
//! ```ignore
//! use health_notice::{NoticeSession, SessionConfig};
//! use health_notice::desktop::DesktopSink;
//!
//! let sink = DesktopSink::new().icon("assets/information.png");
//! let session = NoticeSession::new(SessionConfig::default(), sink);
//! session.connect()?;
//! ```

use std::sync::Arc;

pub use health_notice_net::*;

#[cfg(feature = "desktop")]
pub mod desktop;

/// Environment variable naming the endpoint URL.
pub const ENDPOINT_ENV: &str = "HEALTH_NOTICE_ENDPOINT";

/// Environment variable naming the notification icon.
pub const ICON_ENV: &str = "HEALTH_NOTICE_ICON";

/// Build a [`SessionConfig`] for the endpoint named by `endpoint`, or
/// [`DEFAULT_ENDPOINT`] when it is `None` or blank.
pub fn config_for(endpoint: Option<String>) -> SessionConfig {
    match endpoint {
        Some(url) if !url.trim().is_empty() => SessionConfig::new(url.trim()),
        _ => SessionConfig::default(),
    }
}

/// The sink the binary uses: desktop notifications when the `desktop`
/// feature is enabled, log lines otherwise.
#[cfg(feature = "desktop")]
pub fn sink_from_env(icon: Option<String>) -> Arc<dyn NotificationSink> {
    let sink = match icon {
        Some(icon) if !icon.is_empty() => desktop::DesktopSink::new().icon(icon),
        _ => desktop::DesktopSink::new(),
    };
    Arc::new(sink)
}

/// The sink the binary uses: desktop notifications when the `desktop`
/// feature is enabled, log lines otherwise.
#[cfg(not(feature = "desktop"))]
pub fn sink_from_env(_icon: Option<String>) -> Arc<dyn NotificationSink> {
    Arc::new(TracingSink)
}
