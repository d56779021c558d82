//! Tracing targets used by the session.
//!
//! The crate logs through the `tracing` crate and never installs a subscriber
//! itself. Applications pick one, for example:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("info,health_notice_net::session=debug")
//!     .init();
//! ```
//!
//! Inbound and outbound frames are logged at `trace` under [`targets::SESSION`],
//! lifecycle changes at `info`/`debug`, recoverable faults at `warn`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Connection lifecycle, handshake, heartbeats, frame traffic.
    pub const SESSION: &str = "health_notice_net::session";
    /// Frame decoding failures.
    pub const CODEC: &str = "health_notice_net::codec";
    /// Notice queue and sink delivery.
    pub const DISPATCH: &str = "health_notice_net::dispatch";
    /// Desktop notification rendering in the `health-notice` crate.
    pub const DESKTOP: &str = "health_notice::desktop";
}

#[cfg(test)]
mod tests {
    use super::targets;

    #[test]
    fn test_targets_are_distinct_module_paths() {
        let all = [
            targets::SESSION,
            targets::CODEC,
            targets::DISPATCH,
            targets::DESKTOP,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(a.contains("::"), "{a}");
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(targets::DESKTOP.starts_with("health_notice::"));
    }
}
