//! Auto-expiring visual notifications

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// A message shown in place of a spoken announcement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Insertion-ordered set of active notifications.
///
/// Each notification removes itself after the display duration. `push` must
/// be called from within a tokio runtime.
#[derive(Clone)]
pub struct NotificationCenter {
    active: Arc<RwLock<Vec<Notification>>>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            active: Arc::new(RwLock::new(Vec::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&self, message: impl Into<String>) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            created_at: Utc::now(),
        };
        self.active.write().push(notification.clone());
        debug!("Notification shown: {}", notification.message);

        let active = self.active.clone();
        let id = notification.id;
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            active.write().retain(|n| n.id != id);
        });

        notification
    }

    /// Currently displayed notifications, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.active.read().clone()
    }

    pub fn len(&self) -> usize {
        self.active.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.read().is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}
