//! # Notifications
//!
//! The engine decides *that* a user must be told something; delivery happens
//! elsewhere, best-effort, through a bounded queue.

pub mod dispatcher;
pub mod intent;
pub mod sink;

pub use dispatcher::{DispatcherSnapshot, DispatcherStats, NotificationDispatcher};
pub use intent::{NotificationIntent, NotificationKind};
pub use sink::{
    InboxNotificationSink, LoggingNotificationSink, NotificationError, NotificationSink,
    RecordingNotificationSink,
};
