//! Quiet-hours alert scheduling.
//!
//! Non-critical alerts arriving inside the user's quiet window are deferred
//! to the window's end; critical-and-above alerts always go out
//! immediately. The window is a minute-of-day range and wraps midnight when
//! start > end (22:00-06:00).

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use vaayu_core::Clock;
use vaayu_weather::{Alert, AlertPriority, AlertSeverity};

use crate::error::NotifyError;

/// User notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub weather_alerts_enabled: bool,
    /// Alerts strictly below this severity are suppressed.
    pub severity_threshold: AlertSeverity,
    pub quiet_hours: QuietHours,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            weather_alerts_enabled: true,
            severity_threshold: AlertSeverity::Low,
            quiet_hours: QuietHours::default(),
        }
    }
}

/// A user-configured time-of-day window during which non-critical
/// notifications are deferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
        }
    }
}

/// What happened to a scheduling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Delivered immediately.
    Dispatched,
    /// Delivery scheduled for the end of quiet hours.
    Deferred(DateTime<Utc>),
    /// Not delivered at all (preferences).
    Suppressed(&'static str),
}

/// Delivery mechanism for alert notifications (system notifications on
/// device, a recording stub in tests).
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch_now(&self, alert: &Alert) -> impl Future<Output = Result<(), NotifyError>> + Send;

    fn dispatch_at(
        &self,
        alert: &Alert,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Applies preferences and quiet hours to incoming weather alerts.
pub struct AlertScheduler<D> {
    prefs: NotificationPrefs,
    dispatcher: D,
    clock: Arc<dyn Clock>,
}

impl<D: NotificationDispatcher> AlertScheduler<D> {
    pub fn new(prefs: NotificationPrefs, dispatcher: D, clock: Arc<dyn Clock>) -> Self {
        Self {
            prefs,
            dispatcher,
            clock,
        }
    }

    pub fn set_prefs(&mut self, prefs: NotificationPrefs) {
        self.prefs = prefs;
    }

    /// Schedule a weather alert for delivery.
    pub async fn schedule_weather_alert(
        &self,
        alert: &Alert,
    ) -> Result<ScheduleOutcome, NotifyError> {
        if !self.prefs.weather_alerts_enabled {
            return Ok(ScheduleOutcome::Suppressed("weather alerts disabled"));
        }

        if alert.severity < self.prefs.severity_threshold {
            return Ok(ScheduleOutcome::Suppressed("below severity threshold"));
        }

        let now = self.clock.now();
        let quiet = &self.prefs.quiet_hours;

        if quiet.enabled
            && in_quiet_window(now.time(), quiet.start, quiet.end)
            && alert.priority < AlertPriority::Critical
        {
            let at = next_window_end(now, quiet.end);
            self.dispatcher.dispatch_at(alert, at).await?;
            tracing::info!("Alert {} deferred to {} (quiet hours)", alert.id, at);
            return Ok(ScheduleOutcome::Deferred(at));
        }

        self.dispatcher.dispatch_now(alert).await?;
        Ok(ScheduleOutcome::Dispatched)
    }
}

/// Minute-of-day containment test for the quiet window `[start, end]`.
///
/// When start > end the window wraps midnight: 22:00-06:00 contains 23:30
/// and 05:00 but not 12:00.
pub fn in_quiet_window(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    use chrono::Timelike;
    let minute = |t: NaiveTime| t.hour() * 60 + t.minute();

    let (n, s, e) = (minute(now), minute(start), minute(end));
    if s <= e {
        s <= n && n <= e
    } else {
        n >= s || n <= e
    }
}

/// The next occurrence of `end` as an instant: today if still ahead of
/// `now`, else tomorrow.
fn next_window_end(now: DateTime<Utc>, end: NaiveTime) -> DateTime<Utc> {
    let today_end = now.date_naive().and_time(end).and_utc();
    if today_end > now {
        today_end
    } else {
        today_end + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use vaayu_core::ManualClock;
    use vaayu_weather::AlertType;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn wrapping_window_contains_late_night_and_early_morning() {
        let (start, end) = (t(22, 0), t(6, 0));
        assert!(in_quiet_window(t(23, 30), start, end));
        assert!(in_quiet_window(t(5, 0), start, end));
        assert!(!in_quiet_window(t(12, 0), start, end));
        assert!(in_quiet_window(t(22, 0), start, end));
        assert!(in_quiet_window(t(6, 0), start, end));
        assert!(!in_quiet_window(t(6, 1), start, end));
    }

    #[test]
    fn non_wrapping_window_is_a_plain_range() {
        let (start, end) = (t(9, 0), t(17, 0));
        assert!(in_quiet_window(t(12, 0), start, end));
        assert!(!in_quiet_window(t(20, 0), start, end));
        assert!(!in_quiet_window(t(8, 59), start, end));
    }

    #[test]
    fn window_end_rolls_to_tomorrow_when_passed() {
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 23, 30, 0).single().unwrap();
        let at = next_window_end(now, t(6, 0));
        assert_eq!(
            at,
            Utc.with_ymd_and_hms(2026, 8, 2, 6, 0, 0).single().unwrap()
        );

        let early = Utc.with_ymd_and_hms(2026, 8, 1, 5, 0, 0).single().unwrap();
        let at = next_window_end(early, t(6, 0));
        assert_eq!(
            at,
            Utc.with_ymd_and_hms(2026, 8, 1, 6, 0, 0).single().unwrap()
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Dispatched {
        Now(String),
        At(String, DateTime<Utc>),
    }

    #[derive(Clone, Default)]
    struct RecordingDispatcher {
        log: Arc<Mutex<Vec<Dispatched>>>,
    }

    impl NotificationDispatcher for RecordingDispatcher {
        async fn dispatch_now(&self, alert: &Alert) -> Result<(), NotifyError> {
            self.log.lock().push(Dispatched::Now(alert.id.clone()));
            Ok(())
        }

        async fn dispatch_at(
            &self,
            alert: &Alert,
            at: DateTime<Utc>,
        ) -> Result<(), NotifyError> {
            self.log.lock().push(Dispatched::At(alert.id.clone(), at));
            Ok(())
        }
    }

    fn alert(id: &str, severity: AlertSeverity, priority: AlertPriority) -> Alert {
        Alert {
            id: id.to_string(),
            kind: AlertType::General,
            severity,
            priority,
            title: "Test".to_string(),
            message: "Test alert".to_string(),
            timestamp: Utc::now(),
            valid_until: None,
            location: None,
            instructions: vec![],
        }
    }

    fn quiet_prefs() -> NotificationPrefs {
        NotificationPrefs {
            weather_alerts_enabled: true,
            severity_threshold: AlertSeverity::Low,
            quiet_hours: QuietHours {
                enabled: true,
                start: t(22, 0),
                end: t(6, 0),
            },
        }
    }

    fn scheduler_at(
        prefs: NotificationPrefs,
        hour: u32,
        minute: u32,
    ) -> (AlertScheduler<RecordingDispatcher>, RecordingDispatcher) {
        let dispatcher = RecordingDispatcher::default();
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2026, 8, 1, hour, minute, 0)
                .single()
                .unwrap(),
        );
        (
            AlertScheduler::new(prefs, dispatcher.clone(), Arc::new(clock)),
            dispatcher,
        )
    }

    #[tokio::test]
    async fn critical_alert_bypasses_quiet_hours() {
        let (scheduler, dispatcher) = scheduler_at(quiet_prefs(), 23, 30);

        let critical = alert("c1", AlertSeverity::Severe, AlertPriority::Critical);
        let outcome = scheduler.schedule_weather_alert(&critical).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::Dispatched);
        assert_eq!(dispatcher.log.lock().len(), 1);
        assert!(matches!(dispatcher.log.lock()[0], Dispatched::Now(_)));
    }

    #[tokio::test]
    async fn warning_alert_is_deferred_to_window_end() {
        let (scheduler, dispatcher) = scheduler_at(quiet_prefs(), 23, 30);

        let warning = alert("w1", AlertSeverity::Moderate, AlertPriority::Warning);
        let outcome = scheduler.schedule_weather_alert(&warning).await.unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 8, 2, 6, 0, 0).single().unwrap();
        assert_eq!(outcome, ScheduleOutcome::Deferred(expected));
        assert_eq!(
            dispatcher.log.lock()[0],
            Dispatched::At("w1".to_string(), expected)
        );
    }

    #[tokio::test]
    async fn outside_quiet_hours_dispatches_immediately() {
        let (scheduler, dispatcher) = scheduler_at(quiet_prefs(), 12, 0);

        let warning = alert("w1", AlertSeverity::Moderate, AlertPriority::Warning);
        let outcome = scheduler.schedule_weather_alert(&warning).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::Dispatched);
        assert!(matches!(dispatcher.log.lock()[0], Dispatched::Now(_)));
    }

    #[tokio::test]
    async fn disabled_preference_suppresses_without_dispatch() {
        let mut prefs = quiet_prefs();
        prefs.weather_alerts_enabled = false;
        let (scheduler, dispatcher) = scheduler_at(prefs, 12, 0);

        let outcome = scheduler
            .schedule_weather_alert(&alert("a", AlertSeverity::High, AlertPriority::Warning))
            .await
            .unwrap();

        assert!(matches!(outcome, ScheduleOutcome::Suppressed(_)));
        assert!(dispatcher.log.lock().is_empty());
    }

    #[tokio::test]
    async fn below_severity_threshold_is_suppressed() {
        let mut prefs = quiet_prefs();
        prefs.severity_threshold = AlertSeverity::High;
        let (scheduler, dispatcher) = scheduler_at(prefs, 12, 0);

        let outcome = scheduler
            .schedule_weather_alert(&alert("a", AlertSeverity::Moderate, AlertPriority::Warning))
            .await
            .unwrap();
        assert!(matches!(outcome, ScheduleOutcome::Suppressed(_)));
        assert!(dispatcher.log.lock().is_empty());

        let outcome = scheduler
            .schedule_weather_alert(&alert("b", AlertSeverity::High, AlertPriority::Warning))
            .await
            .unwrap();
        assert_eq!(outcome, ScheduleOutcome::Dispatched);
    }
}
