//! Device location provider.
//!
//! Wraps a platform position source with a bounded wait, last-known-value
//! caching, and an optional continuous watch. The cached location is served
//! when a fresh fix can't be obtained in time; permission denial is
//! surfaced as-is so the UI can show a permission prompt instead of a
//! network error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use vaayu_core::{Clock, LocationError};
use vaayu_store::{keys, StoreClient};

use crate::geocode::reverse_geocode;
use crate::types::Location;

/// Maximum wait for a position fix before falling back to the cached
/// last-known location.
pub const FIX_TIMEOUT: Duration = Duration::from_secs(10);

/// A raw position reading from the platform.
#[derive(Debug, Clone, Copy)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

/// Platform position source (GPS, network positioning, a test stub).
pub trait PositionSource: Send + Sync + 'static {
    fn current_fix(&self) -> impl Future<Output = Result<PositionFix, LocationError>> + Send;
}

/// Handle to a running location watch; aborts the polling task when
/// stopped or dropped.
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Location provider with caching and timeout fallback.
pub struct LocationProvider<S> {
    source: Arc<S>,
    store: StoreClient,
    clock: Arc<dyn Clock>,
    geocoding: bool,
}

impl<S: PositionSource> LocationProvider<S> {
    pub fn new(source: S, store: StoreClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            source: Arc::new(source),
            store,
            clock,
            geocoding: true,
        }
    }

    /// Disable reverse geocoding (tests, privacy mode).
    pub fn without_geocoding(mut self) -> Self {
        self.geocoding = false;
        self
    }

    /// Get the current location.
    ///
    /// Waits at most [`FIX_TIMEOUT`] for a fix; on timeout or a positioning
    /// failure the cached last-known location is returned instead.
    /// Permission denial is never masked by the cache.
    pub async fn current_location(&self) -> Result<Location, LocationError> {
        match tokio::time::timeout(FIX_TIMEOUT, self.source.current_fix()).await {
            Ok(Ok(fix)) => {
                let mut location = Location::new(fix.latitude, fix.longitude, self.clock.now());
                location.accuracy = fix.accuracy;

                if self.geocoding {
                    location.address = reverse_geocode(fix.latitude, fix.longitude).await;
                }

                if let Err(e) = self.store.put(keys::LAST_KNOWN_LOCATION, &location).await {
                    tracing::warn!("Failed to cache location: {}", e);
                }

                Ok(location)
            }
            Ok(Err(LocationError::PermissionDenied)) => Err(LocationError::PermissionDenied),
            Ok(Err(e)) => {
                tracing::warn!("Position fix failed: {}", e);
                match self.cached_location().await {
                    Some(cached) => Ok(cached),
                    None => Err(e),
                }
            }
            Err(_) => {
                tracing::warn!("Position fix timed out after {:?}", FIX_TIMEOUT);
                match self.cached_location().await {
                    Some(cached) => Ok(cached),
                    None => Err(LocationError::Timeout),
                }
            }
        }
    }

    /// Immediately return the persisted last-known location, if any.
    pub async fn cached_location(&self) -> Option<Location> {
        match self.store.get(keys::LAST_KNOWN_LOCATION).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Failed to read cached location: {}", e);
                None
            }
        }
    }

    /// Start a continuous watch, polling the source every `interval`.
    ///
    /// Each successful fix is published on the returned channel and
    /// persisted. The task stops when the handle is dropped.
    pub fn watch(&self, interval: Duration) -> (WatchHandle, watch::Receiver<Option<Location>>) {
        let (tx, rx) = watch::channel(None);
        let source = self.source.clone();
        let store = self.store.clone();
        let clock = self.clock.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match source.current_fix().await {
                    Ok(fix) => {
                        let mut location = Location::new(fix.latitude, fix.longitude, clock.now());
                        location.accuracy = fix.accuracy;

                        if let Err(e) = store.put(keys::LAST_KNOWN_LOCATION, &location).await {
                            tracing::warn!("Failed to cache watched location: {}", e);
                        }
                        tx.send_replace(Some(location));
                    }
                    Err(e) => {
                        tracing::debug!("Watch fix failed: {}", e);
                    }
                }
            }
        });

        (WatchHandle { task }, rx)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::Utc;
    use vaayu_core::ManualClock;

    struct FixedSource {
        fix: PositionFix,
    }

    impl PositionSource for FixedSource {
        fn current_fix(
            &self,
        ) -> impl Future<Output = Result<PositionFix, LocationError>> + Send {
            let fix = self.fix;
            async move { Ok(fix) }
        }
    }

    struct DeniedSource;

    impl PositionSource for DeniedSource {
        fn current_fix(
            &self,
        ) -> impl Future<Output = Result<PositionFix, LocationError>> + Send {
            async { Err(LocationError::PermissionDenied) }
        }
    }

    struct StalledSource;

    impl PositionSource for StalledSource {
        fn current_fix(
            &self,
        ) -> impl Future<Output = Result<PositionFix, LocationError>> + Send {
            std::future::pending()
        }
    }

    struct UnavailableSource;

    impl PositionSource for UnavailableSource {
        fn current_fix(
            &self,
        ) -> impl Future<Output = Result<PositionFix, LocationError>> + Send {
            async { Err(LocationError::Unavailable) }
        }
    }

    fn provider<S: PositionSource>(source: S, store: StoreClient) -> LocationProvider<S> {
        LocationProvider::new(source, store, Arc::new(ManualClock::new(Utc::now())))
            .without_geocoding()
    }

    #[tokio::test]
    async fn test_fix_is_returned_and_cached() {
        let store = StoreClient::in_memory();
        let p = provider(
            FixedSource {
                fix: PositionFix {
                    latitude: 18.52,
                    longitude: 73.86,
                    accuracy: Some(12.0),
                },
            },
            store.clone(),
        );

        let location = p.current_location().await.unwrap();
        assert_eq!(location.latitude, 18.52);
        assert_eq!(location.accuracy, Some(12.0));

        let cached: Option<Location> = store.get(keys::LAST_KNOWN_LOCATION).await.unwrap();
        assert_eq!(cached.unwrap().longitude, 73.86);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_cached() {
        let store = StoreClient::in_memory();
        let cached = Location::new(10.0, 20.0, Utc::now());
        store.put(keys::LAST_KNOWN_LOCATION, &cached).await.unwrap();

        let p = provider(StalledSource, store);
        let location = p.current_location().await.unwrap();
        assert_eq!(location.latitude, 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_cache_errors() {
        let p = provider(StalledSource, StoreClient::in_memory());
        let result = p.current_location().await;
        assert!(matches!(result, Err(LocationError::Timeout)));
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_masked_by_cache() {
        let store = StoreClient::in_memory();
        let cached = Location::new(10.0, 20.0, Utc::now());
        store.put(keys::LAST_KNOWN_LOCATION, &cached).await.unwrap();

        let p = provider(DeniedSource, store);
        let result = p.current_location().await;
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_source_failure_falls_back_to_cached() {
        let store = StoreClient::in_memory();
        let cached = Location::new(10.0, 20.0, Utc::now());
        store.put(keys::LAST_KNOWN_LOCATION, &cached).await.unwrap();

        let p = provider(UnavailableSource, store);
        let location = p.current_location().await.unwrap();
        assert_eq!(location.latitude, 10.0);
    }

    #[tokio::test]
    async fn test_watch_publishes_fixes() {
        let store = StoreClient::in_memory();
        let p = provider(
            FixedSource {
                fix: PositionFix {
                    latitude: 1.0,
                    longitude: 2.0,
                    accuracy: None,
                },
            },
            store,
        );

        let (handle, mut rx) = p.watch(Duration::from_millis(10));
        rx.changed().await.unwrap();
        let location = rx.borrow().clone().unwrap();
        assert_eq!(location.latitude, 1.0);

        handle.stop();
    }
}
