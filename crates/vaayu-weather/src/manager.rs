//! Weather data cache and freshness manager.
//!
//! Owns the single "current" snapshot for the active location and every
//! policy around it: concurrent fan-out fetch with all-or-nothing snapshot
//! replacement, persisted cache fallback with a 30-minute horizon, a
//! separate 15-minute display-staleness horizon, a 10-minute background
//! refresh, and generation fencing so a superseded fetch can never clobber
//! a newer result.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use vaayu_core::Clock;
use vaayu_store::{keys, CacheEntry, StoreClient};

use crate::alert::{active_alerts, Alert};
use crate::client::WeatherClient;
use crate::error::WeatherError;
use crate::types::{HourlyForecast, Location, WeatherSnapshot, WeatherTrend};

/// Past this age the displayed data is flagged stale in the UI.
const STALE_AFTER_MINUTES: i64 = 15;

/// Past this age a persisted snapshot is no longer served as a fallback.
/// Independent of the display-staleness horizon above.
const CACHE_FALLBACK_MINUTES: i64 = 30;

/// Background refresh period.
const REFRESH_INTERVAL: StdDuration = StdDuration::from_secs(10 * 60);

/// Hourly points consulted by the trend derivation.
const TREND_WINDOW: usize = 6;

#[derive(Debug, Default)]
struct ManagerState {
    snapshot: Option<WeatherSnapshot>,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
    loading: bool,
}

/// State change notification delivered to subscribers.
#[derive(Debug, Clone, Default)]
pub struct WeatherUpdate {
    pub snapshot: Option<WeatherSnapshot>,
    pub last_updated: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Handle to the background refresh task; aborts it when stopped or
/// dropped so a location change can't leak timers.
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Weather cache/freshness manager.
#[derive(Clone)]
pub struct WeatherManager {
    client: WeatherClient,
    store: StoreClient,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<ManagerState>>,
    generation: Arc<AtomicU64>,
    refreshing: Arc<AtomicBool>,
    updates: Arc<watch::Sender<WeatherUpdate>>,
    refresh_interval: StdDuration,
}

impl WeatherManager {
    pub fn new(client: WeatherClient, store: StoreClient, clock: Arc<dyn Clock>) -> Self {
        let (tx, _rx) = watch::channel(WeatherUpdate::default());
        Self {
            client,
            store,
            clock,
            state: Arc::new(Mutex::new(ManagerState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            refreshing: Arc::new(AtomicBool::new(false)),
            updates: Arc::new(tx),
            refresh_interval: REFRESH_INTERVAL,
        }
    }

    /// Override the background refresh period (config-driven).
    pub fn with_refresh_interval(mut self, interval: StdDuration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Subscribe to state change notifications.
    pub fn subscribe(&self) -> watch::Receiver<WeatherUpdate> {
        self.updates.subscribe()
    }

    /// Fetch current conditions, forecast and alerts for `location`.
    ///
    /// The three sub-requests run concurrently and the snapshot is replaced
    /// only if all three succeed. On failure the persisted cache (if still
    /// within its fallback horizon) is loaded; otherwise the previous
    /// in-memory snapshot is retained.
    ///
    /// A location without usable coordinates makes this a no-op.
    /// `silent` suppresses the loading flag, nothing else.
    pub async fn fetch(&self, location: &Location, silent: bool) -> Result<(), WeatherError> {
        if !location.has_coordinates() {
            tracing::debug!("Skipping weather fetch: location has no usable coordinates");
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.refreshing.store(true, Ordering::SeqCst);

        if !silent {
            self.state.lock().loading = true;
            self.emit();
        }

        let result = tokio::try_join!(
            self.client.current(location.latitude, location.longitude),
            self.client.forecast(location.latitude, location.longitude),
            self.client.alerts(location.latitude, location.longitude),
        );

        let outcome = match result {
            Ok((current, forecast, alerts)) => {
                if self.is_latest(generation) {
                    let now = self.clock.now();
                    let snapshot = WeatherSnapshot {
                        current,
                        forecast,
                        alerts,
                        location: location.clone(),
                        fetched_at: now,
                    };

                    {
                        let mut state = self.state.lock();
                        state.snapshot = Some(snapshot.clone());
                        state.last_updated = Some(now);
                        state.last_error = None;
                    }

                    let entry = CacheEntry::new(snapshot, now);
                    if let Err(e) = self.store.put(keys::WEATHER_CACHE, &entry).await {
                        tracing::warn!("Failed to persist weather cache: {}", e);
                    }
                } else {
                    tracing::debug!(
                        "Discarding weather fetch result from superseded generation {}",
                        generation
                    );
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Weather fetch failed: {}", e);
                if self.is_latest(generation) {
                    self.state.lock().last_error = Some(e.user_message());

                    // Last-known-good stays in memory if the cache misses too.
                    if let Some(entry) = self.load_cached_entry().await {
                        let mut state = self.state.lock();
                        state.snapshot = Some(entry.value);
                        state.last_updated = Some(entry.timestamp);
                    }
                }
                Err(e)
            }
        };

        if !silent {
            self.state.lock().loading = false;
        }
        self.refreshing.store(false, Ordering::SeqCst);
        self.emit();

        outcome
    }

    /// The persisted snapshot, if it is still within the 30-minute fallback
    /// horizon. Older bytes remain on disk but are logically absent.
    pub async fn load_cached_snapshot(&self) -> Option<WeatherSnapshot> {
        self.load_cached_entry().await.map(|entry| entry.value)
    }

    async fn load_cached_entry(&self) -> Option<CacheEntry<WeatherSnapshot>> {
        let entry: CacheEntry<WeatherSnapshot> = match self.store.get(keys::WEATHER_CACHE).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read weather cache: {}", e);
                return None;
            }
        };

        if entry.is_fresh(self.clock.now(), Duration::minutes(CACHE_FALLBACK_MINUTES)) {
            Some(entry)
        } else {
            None
        }
    }

    /// Whether the displayed data should carry a stale banner. Purely a UI
    /// annotation; never triggers a fetch by itself.
    pub fn is_stale(&self) -> bool {
        let last_updated = self.state.lock().last_updated;
        match last_updated {
            None => true,
            Some(at) => self.clock.now() - at > Duration::minutes(STALE_AFTER_MINUTES),
        }
    }

    /// Alerts from the current snapshot still within the 24-hour activity
    /// window, in upstream order.
    pub fn active_alerts(&self) -> Vec<Alert> {
        let state = self.state.lock();
        match &state.snapshot {
            Some(snapshot) => active_alerts(&snapshot.alerts, self.clock.now()),
            None => Vec::new(),
        }
    }

    /// Short-term temperature trend from the current snapshot.
    pub fn weather_trend(&self) -> WeatherTrend {
        let state = self.state.lock();
        match &state.snapshot {
            Some(snapshot) => trend_from_hourly(&snapshot.forecast.hourly),
            None => WeatherTrend::Stable,
        }
    }

    pub fn snapshot(&self) -> Option<WeatherSnapshot> {
        self.state.lock().snapshot.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_updated
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// One-shot current+forecast for an arbitrary location (saved-location
    /// previews). Does not touch the active snapshot or the cache.
    pub async fn weather_for_location(
        &self,
        location: &Location,
    ) -> Result<(crate::types::CurrentConditions, crate::types::ForecastBundle), WeatherError> {
        tokio::try_join!(
            self.client.current(location.latitude, location.longitude),
            self.client.forecast(location.latitude, location.longitude),
        )
    }

    /// Raw AI model forecast for a location.
    pub async fn ai_forecast(&self, location: &Location) -> Result<serde_json::Value, WeatherError> {
        self.client
            .ai_forecast(location.latitude, location.longitude)
            .await
    }

    /// Start the background refresh task for `location`.
    ///
    /// Ticks are skipped (not queued) while another fetch is in flight.
    /// The task is owned by the returned handle and aborted on drop.
    pub fn start_auto_refresh(&self, location: Location) -> RefreshHandle {
        let manager = self.clone();
        let interval = self.refresh_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The interval's first tick fires immediately; the caller has
            // already fetched for this location.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if manager.refreshing.load(Ordering::SeqCst) {
                    tracing::trace!("Skipping refresh tick: fetch already in flight");
                    continue;
                }

                if let Err(e) = manager.fetch(&location, true).await {
                    tracing::debug!("Background refresh failed: {}", e);
                }
            }
        });

        RefreshHandle { task }
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn emit(&self) {
        let update = {
            let state = self.state.lock();
            WeatherUpdate {
                snapshot: state.snapshot.clone(),
                last_updated: state.last_updated,
                loading: state.loading,
                error: state.last_error.clone(),
            }
        };
        self.updates.send_replace(update);
    }
}

/// Adjacent-pair temperature trend over the first [`TREND_WINDOW`] hourly
/// points. Fewer points than the window means no call is made: `Stable`.
pub fn trend_from_hourly(hourly: &[HourlyForecast]) -> WeatherTrend {
    if hourly.len() < TREND_WINDOW {
        return WeatherTrend::Stable;
    }

    let mut increasing = 0;
    let mut decreasing = 0;
    for pair in hourly[..TREND_WINDOW].windows(2) {
        if pair[1].temperature > pair[0].temperature {
            increasing += 1;
        } else if pair[1].temperature < pair[0].temperature {
            decreasing += 1;
        }
    }

    if increasing > decreasing {
        WeatherTrend::Warming
    } else if decreasing > increasing {
        WeatherTrend::Cooling
    } else {
        WeatherTrend::Stable
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;

    fn hourly(temps: &[f64]) -> Vec<HourlyForecast> {
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).single().unwrap();
        temps
            .iter()
            .enumerate()
            .map(|(i, &t)| HourlyForecast {
                time: base + Duration::hours(i as i64),
                temperature: t,
                condition: "clear".to_string(),
                precipitation_chance: 0,
            })
            .collect()
    }

    #[test]
    fn test_trend_warming() {
        let points = hourly(&[20.0, 21.0, 22.0, 21.5, 23.0, 24.0]);
        assert_eq!(trend_from_hourly(&points), WeatherTrend::Warming);
    }

    #[test]
    fn test_trend_cooling() {
        let points = hourly(&[24.0, 23.0, 22.5, 23.0, 21.0, 20.0]);
        assert_eq!(trend_from_hourly(&points), WeatherTrend::Cooling);
    }

    #[test]
    fn test_trend_stable_on_balance() {
        let points = hourly(&[20.0, 21.0, 20.0, 21.0, 20.0, 20.0]);
        assert_eq!(trend_from_hourly(&points), WeatherTrend::Stable);
    }

    #[test]
    fn test_trend_requires_six_points() {
        let points = hourly(&[20.0, 25.0, 30.0, 35.0, 40.0]);
        assert_eq!(trend_from_hourly(&points), WeatherTrend::Stable);
    }

    #[test]
    fn test_trend_only_consults_first_six_points() {
        // Rising inside the window, falling after it.
        let points = hourly(&[20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 10.0, 5.0]);
        assert_eq!(trend_from_hourly(&points), WeatherTrend::Warming);
    }
}
