//! `gigboard-notifications` — notification records derived from lifecycle
//! transitions.

pub mod notification;

pub use notification::{Notification, NotificationKind, RETENTION_DAYS};
