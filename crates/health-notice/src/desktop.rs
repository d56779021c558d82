//! Desktop notifications for server notices.
//!
//! [`DesktopSink`] renders each notice as a system notification via
//! `notify-rust`. Rendering blocks on the notification server, which is why
//! the session calls sinks from the blocking pool.
//!
//! # Platform Notes
//!
//! - **Linux**: Shown through the freedesktop notification server over D-Bus
//! - **macOS**: Summary and body only; the icon is ignored
//! - **Windows**: Summary, body and icon

use health_notice_net::logging::targets;
use health_notice_net::{NotificationSink, SinkError};
use tracing::debug;

const DEFAULT_APP_NAME: &str = "health-notice";

/// Notification timeout configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Use the notification server's default.
    Default,
    /// Never auto-dismiss.
    Never,
    /// Dismiss after the specified number of milliseconds.
    Milliseconds(u32),
}

impl Default for Timeout {
    fn default() -> Self {
        Self::Milliseconds(5000)
    }
}

impl From<Timeout> for notify_rust::Timeout {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Default => notify_rust::Timeout::Default,
            Timeout::Never => notify_rust::Timeout::Never,
            Timeout::Milliseconds(ms) => notify_rust::Timeout::Milliseconds(ms),
        }
    }
}

/// A [`NotificationSink`] that shows notices as desktop notifications.
///
/// The notice title becomes the notification summary and the message its body.
///
/// ```ignore
/// let sink = DesktopSink::new()
///     .icon("assets/information.png")
///     .timeout(Timeout::Milliseconds(8000));
/// ```
#[derive(Debug, Clone)]
pub struct DesktopSink {
    icon: Option<String>,
    app_name: String,
    timeout: Timeout,
}

impl Default for DesktopSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopSink {
    /// Create a sink with a 5 second timeout and no icon.
    pub fn new() -> Self {
        Self {
            icon: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            timeout: Timeout::default(),
        }
    }

    /// Set the notification icon.
    ///
    /// This can be an icon name from the current theme (e.g. "dialog-information")
    /// or a path to an image file.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the application name shown with the notification.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set how long notifications stay on screen.
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the notify-rust notification for one notice.
    fn build_notification(
        &self,
        title: &str,
        message: &str,
    ) -> Result<notify_rust::Notification, SinkError> {
        if title.trim().is_empty() {
            return Err(SinkError::new("notification summary is required"));
        }

        let mut notification = notify_rust::Notification::new();
        notification
            .summary(title)
            .body(message)
            .appname(&self.app_name)
            .timeout(notify_rust::Timeout::from(self.timeout));

        if let Some(ref icon) = self.icon {
            notification.icon(icon);
        }

        Ok(notification)
    }
}

impl NotificationSink for DesktopSink {
    fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        let notification = self.build_notification(title, message)?;
        let _handle = notification
            .show()
            .map_err(|e| SinkError::new(e.to_string()))?;
        debug!(target: targets::DESKTOP, %title, "desktop notification shown");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_is_five_seconds() {
        let sink = DesktopSink::new();
        assert_eq!(sink.timeout, Timeout::Milliseconds(5000));
        assert_eq!(sink.app_name, "health-notice");
        assert!(sink.icon.is_none());
    }

    #[test]
    fn test_builder_options() {
        let sink = DesktopSink::new()
            .icon("assets/information.png")
            .app_name("monitor")
            .timeout(Timeout::Never);
        assert_eq!(sink.icon.as_deref(), Some("assets/information.png"));
        assert_eq!(sink.app_name, "monitor");
        assert_eq!(sink.timeout, Timeout::Never);
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let sink = DesktopSink::new();
        let err = sink.notify("  ", "body").unwrap_err();
        assert!(err.message().contains("summary"));
    }

    #[test]
    fn test_timeout_conversion() {
        assert!(matches!(
            notify_rust::Timeout::from(Timeout::Milliseconds(250)),
            notify_rust::Timeout::Milliseconds(250)
        ));
        assert!(matches!(
            notify_rust::Timeout::from(Timeout::Never),
            notify_rust::Timeout::Never
        ));
    }
}
