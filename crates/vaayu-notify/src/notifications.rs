//! Persisted in-app notification list.
//!
//! Most-recent-first, read flags, kind filtering. Store failures are
//! logged and the operation proceeds; the list is rebuilt from storage on
//! every call, so a lost write costs at most one entry.

use std::sync::Arc;

use serde_json::Value;

use vaayu_core::Clock;
use vaayu_store::{keys, StoreClient};

use crate::types::{NotificationKind, NotificationPriority, NotificationRecord};

/// In-app notification manager.
pub struct NotificationCenter {
    store: StoreClient,
    clock: Arc<dyn Clock>,
}

impl NotificationCenter {
    pub fn new(store: StoreClient, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Add a notification at the head of the list.
    pub async fn add(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Option<Value>,
        priority: NotificationPriority,
    ) -> NotificationRecord {
        let record = NotificationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            data,
            priority,
            timestamp: self.clock.now(),
            read: false,
        };

        let mut list = self.list().await;
        list.insert(0, record.clone());
        self.save(&list).await;

        record
    }

    /// All notifications, most recent first.
    pub async fn list(&self) -> Vec<NotificationRecord> {
        match self.store.get(keys::NOTIFICATIONS).await {
            Ok(Some(list)) => list,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read notifications: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn unread_count(&self) -> usize {
        self.list().await.iter().filter(|n| !n.read).count()
    }

    /// Mark one notification as read. Returns whether it was found.
    pub async fn mark_read(&self, id: &str) -> bool {
        let mut list = self.list().await;
        let mut found = false;
        for record in list.iter_mut().filter(|n| n.id == id) {
            record.read = true;
            found = true;
        }
        if found {
            self.save(&list).await;
        }
        found
    }

    pub async fn mark_all_read(&self) {
        let mut list = self.list().await;
        for record in list.iter_mut() {
            record.read = true;
        }
        self.save(&list).await;
    }

    pub async fn remove(&self, id: &str) {
        let list: Vec<NotificationRecord> = self
            .list()
            .await
            .into_iter()
            .filter(|n| n.id != id)
            .collect();
        self.save(&list).await;
    }

    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(keys::NOTIFICATIONS).await {
            tracing::warn!("Failed to clear notifications: {}", e);
        }
    }

    pub async fn of_kind(&self, kind: NotificationKind) -> Vec<NotificationRecord> {
        self.list()
            .await
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    async fn save(&self, list: &[NotificationRecord]) {
        if let Err(e) = self.store.put(keys::NOTIFICATIONS, &list).await {
            tracing::warn!("Failed to persist notifications: {}", e);
        }
    }
}
