//! Notification and feedback layer for the Vaayu client.
//!
//! Durable pending-feedback queue with an eligibility window, at-least-once
//! feedback delivery with offline degradation, the in-app notification
//! list, and quiet-hours alert scheduling.

pub mod error;
pub mod notifications;
pub mod queue;
pub mod scheduler;
pub mod types;

pub use error::NotifyError;
pub use notifications::NotificationCenter;
pub use queue::{FeedbackQueue, FeedbackSink, HttpFeedbackSink};
pub use scheduler::{
    in_quiet_window, AlertScheduler, NotificationDispatcher, NotificationPrefs, QuietHours,
    ScheduleOutcome,
};
pub use types::{
    FeedbackRecord, NotificationKind, NotificationPriority, NotificationRecord,
    PendingFeedbackItem, PushMessage, RewardSignal,
};
