//! Durable pending-feedback queue and feedback delivery.
//!
//! At-least-once by construction: a queue entry survives until feedback for
//! its alert is delivered successfully, and a failed delivery lands the
//! record in a local unsynced list that a later sync pass drains. Duplicate
//! reward signals are tolerated by the trainer; nothing is deduplicated on
//! the wire.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use url::Url;

use vaayu_core::retry::{with_retry, RetryConfig};
use vaayu_core::Clock;
use vaayu_store::{keys, StoreClient};
use vaayu_weather::Location;

use crate::error::NotifyError;
use crate::types::{FeedbackRecord, PendingFeedbackItem, PushMessage, RewardSignal};

/// An alert becomes promptable one hour after receipt...
const ELIGIBLE_AFTER_HOURS: i64 = 1;
/// ...and is silently dropped a day after receipt.
const EXPIRES_AFTER_HOURS: i64 = 24;

/// Remote delivery targets for feedback: the durable document store and the
/// recommendation trainer's reward endpoint. Both must succeed for a
/// submission to count as delivered.
pub trait FeedbackSink: Send + Sync {
    fn store_document(
        &self,
        record: &FeedbackRecord,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    fn forward_reward(
        &self,
        signal: &RewardSignal,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// HTTP sink: documents to the feedback document collection, rewards to the
/// backend's feedback endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeedbackSink {
    client: reqwest::Client,
    documents_url: Url,
    reward_url: Url,
}

impl HttpFeedbackSink {
    pub fn new(documents_base: &str, backend_base: &str) -> Result<Self, NotifyError> {
        let documents_url = Url::parse(documents_base)
            .and_then(|u| u.join("user_feedback"))
            .map_err(|e| NotifyError::Url(e.to_string()))?;
        let reward_url = Url::parse(backend_base)
            .and_then(|u| u.join("feedback"))
            .map_err(|e| NotifyError::Url(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            documents_url,
            reward_url,
        })
    }

    async fn check(response: reqwest::Response) -> Result<(), NotifyError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

impl FeedbackSink for HttpFeedbackSink {
    async fn store_document(&self, record: &FeedbackRecord) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.documents_url.clone())
            .json(record)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn forward_reward(&self, signal: &RewardSignal) -> Result<(), NotifyError> {
        // Transient failures here strand a reward until the next app
        // foreground, so this call gets a bounded backoff.
        let response = with_retry(RetryConfig::default(), || {
            self.client
                .post(self.reward_url.clone())
                .json(signal)
                .send()
        })
        .await?;
        Self::check(response).await
    }
}

/// Pending-feedback queue manager.
pub struct FeedbackQueue<K> {
    store: StoreClient,
    sink: K,
    clock: Arc<dyn Clock>,
}

impl<K: FeedbackSink> FeedbackQueue<K> {
    pub fn new(store: StoreClient, sink: K, clock: Arc<dyn Clock>) -> Self {
        Self { store, sink, clock }
    }

    /// Capture an inbound push if it carries a weather alert.
    ///
    /// Returns whether the push was queued. Applies even when the app is
    /// foregrounded without user interaction.
    pub async fn handle_push(&self, message: &PushMessage) -> bool {
        if !message.is_weather_alert() {
            return false;
        }
        let Some(alert_id) = message.alert_id() else {
            tracing::warn!("Weather alert push without alertId; not queued for feedback");
            return false;
        };
        self.enqueue_pending(alert_id, message.data.clone()).await;
        true
    }

    /// Append an alert to the pending-feedback queue.
    ///
    /// Repeated delivery of the same alert id keeps the original entry
    /// (and its received-at instant) rather than stacking duplicates.
    pub async fn enqueue_pending(&self, alert_id: &str, payload: Value) {
        let mut items = self.load_queue().await;
        if items.iter().any(|i| i.alert_id == alert_id) {
            tracing::debug!("Alert {} already pending feedback; duplicate ignored", alert_id);
            return;
        }

        items.push(PendingFeedbackItem {
            alert_id: alert_id.to_string(),
            received_at: self.clock.now(),
            feedback_requested: false,
            payload,
        });
        self.save_queue(&items).await;
    }

    /// Items currently inside the prompt window: at least one hour old,
    /// less than a day old, not yet prompted. Entries past the expiry
    /// horizon are pruned from storage and never surfaced again.
    pub async fn eligible_feedback(&self) -> Vec<PendingFeedbackItem> {
        let now = self.clock.now();
        let items = self.load_queue().await;

        let live: Vec<PendingFeedbackItem> = items
            .iter()
            .filter(|i| now - i.received_at < Duration::hours(EXPIRES_AFTER_HOURS))
            .cloned()
            .collect();
        if live.len() != items.len() {
            self.save_queue(&live).await;
        }

        live.into_iter()
            .filter(|i| {
                now - i.received_at >= Duration::hours(ELIGIBLE_AFTER_HOURS)
                    && !i.feedback_requested
            })
            .collect()
    }

    /// Flag an alert as having been prompted. Eligibility reads don't
    /// mutate anything; the prompt's owner calls this.
    pub async fn mark_requested(&self, alert_id: &str) {
        let mut items = self.load_queue().await;
        let mut changed = false;
        for item in items.iter_mut().filter(|i| i.alert_id == alert_id) {
            item.feedback_requested = true;
            changed = true;
        }
        if changed {
            self.save_queue(&items).await;
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.load_queue().await.len()
    }

    /// Deliver the user's verdict on an alert.
    ///
    /// On success every queue entry for the alert is consumed. On failure
    /// the record is kept in the local unsynced list for a later
    /// [`Self::sync_unsynced`] pass and the queue entry stays, so the user
    /// may be prompted again.
    pub async fn submit_feedback(
        &self,
        alert_id: &str,
        user_id: &str,
        was_helpful: bool,
        location: Option<Location>,
    ) -> Result<(), NotifyError> {
        let record = FeedbackRecord {
            alert_id: alert_id.to_string(),
            user_id: user_id.to_string(),
            was_helpful,
            location,
            timestamp: self.clock.now(),
            synced: false,
        };
        let signal = RewardSignal::for_record(&record);

        let delivery = async {
            self.sink.store_document(&record).await?;
            self.sink.forward_reward(&signal).await
        }
        .await;

        match delivery {
            Ok(()) => {
                let items = self.load_queue().await;
                let remaining: Vec<PendingFeedbackItem> = items
                    .into_iter()
                    .filter(|i| i.alert_id != alert_id)
                    .collect();
                self.save_queue(&remaining).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Feedback delivery failed, keeping record locally: {}", e);
                let mut local = self.load_local().await;
                local.push(record);
                self.save_local(&local).await;
                Err(e)
            }
        }
    }

    /// Retry delivery of locally stored feedback records.
    ///
    /// Safe to call repeatedly (each app foreground): records already
    /// synced are skipped, failures leave their record untouched, and
    /// nothing is ever deleted here. Returns how many records were synced
    /// by this pass.
    pub async fn sync_unsynced(&self) -> usize {
        let mut records = self.load_local().await;
        let mut synced = 0;

        for record in records.iter_mut().filter(|r| !r.synced) {
            let signal = RewardSignal::for_record(record);
            if let Err(e) = self.sink.forward_reward(&signal).await {
                tracing::warn!("Reward sync failed for alert {}: {}", record.alert_id, e);
                continue;
            }
            if let Err(e) = self.sink.store_document(record).await {
                tracing::warn!("Document sync failed for alert {}: {}", record.alert_id, e);
                continue;
            }
            record.synced = true;
            synced += 1;
        }

        if synced > 0 {
            self.save_local(&records).await;
            tracing::info!("Synced {} feedback record(s)", synced);
        }
        synced
    }

    pub async fn unsynced_count(&self) -> usize {
        self.load_local().await.iter().filter(|r| !r.synced).count()
    }

    async fn load_queue(&self) -> Vec<PendingFeedbackItem> {
        match self.store.get(keys::PENDING_ALERT_FEEDBACK).await {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read pending feedback queue: {}", e);
                Vec::new()
            }
        }
    }

    async fn save_queue(&self, items: &[PendingFeedbackItem]) {
        if let Err(e) = self.store.put(keys::PENDING_ALERT_FEEDBACK, &items).await {
            tracing::warn!("Failed to persist pending feedback queue: {}", e);
        }
    }

    async fn load_local(&self) -> Vec<FeedbackRecord> {
        match self.store.get(keys::LOCAL_FEEDBACK).await {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read local feedback list: {}", e);
                Vec::new()
            }
        }
    }

    async fn save_local(&self, records: &[FeedbackRecord]) {
        if let Err(e) = self.store.put(keys::LOCAL_FEEDBACK, &records).await {
            tracing::warn!("Failed to persist local feedback list: {}", e);
        }
    }
}
