//! User-visible status notifications

use std::fmt;
use tracing::{error, info, warn};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(name)
    }
}

/// Sink for status signals produced by the connection manager
///
/// Called synchronously on the connection driver, so implementations must not
/// block.
pub trait Notifier: Send {
    fn notify(&self, kind: NotificationKind, title: &str, message: Option<&str>);
}

/// Notifier that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, message: Option<&str>) {
        let message = message.unwrap_or_default();
        match kind {
            NotificationKind::Error => error!("[{}] {} {}", kind, title, message),
            NotificationKind::Warning => warn!("[{}] {} {}", kind, title, message),
            NotificationKind::Success | NotificationKind::Info => {
                info!("[{}] {} {}", kind, title, message)
            }
        }
    }
}
