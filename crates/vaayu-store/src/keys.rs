//! Well-known store keys.
//!
//! Each key is logically owned by one component; there is no
//! cross-component contention on a single key. The string values match the
//! mobile client's storage layout, so an existing device database remains
//! readable.

/// Cached `CacheEntry<WeatherSnapshot>` for the active location.
pub const WEATHER_CACHE: &str = "weatherCache";

/// Most-recent-first list of `NotificationRecord`s.
pub const NOTIFICATIONS: &str = "notifications";

/// Queue of `PendingFeedbackItem`s awaiting a feedback prompt.
pub const PENDING_ALERT_FEEDBACK: &str = "pendingAlertFeedback";

/// `FeedbackRecord`s not yet delivered to the backend (`synced == false`
/// until the sync pass succeeds).
pub const LOCAL_FEEDBACK: &str = "localFeedback";

/// Last successfully obtained `Location`.
pub const LAST_KNOWN_LOCATION: &str = "lastKnownLocation";
