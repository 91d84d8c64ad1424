//! Auto-expiring toast notifications.
//!
//! Every toast gets its own identity and its own expiry timer, so two toasts
//! carrying the same message never share a lifetime.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
    ttl: Duration,
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            ttl,
        }
    }

    /// Append a toast and schedule its removal after the queue's ttl.
    pub async fn push(&self, kind: ToastKind, message: impl Into<String>) -> Uuid {
        self.push_toast(Toast::new(kind, message)).await
    }

    pub async fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Success, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Error, message).await
    }

    pub async fn push_toast(&self, toast: Toast) -> Uuid {
        let id = toast.id;
        debug!("Toast {:?}: {}", toast.kind, toast.message);
        self.toasts.lock().await.push(toast);

        // the timer must not keep a dropped queue alive
        let toasts = Arc::downgrade(&self.toasts);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(toasts) = toasts.upgrade() {
                toasts.lock().await.retain(|t| t.id != id);
            }
        });

        id
    }

    /// Remove a toast before its timer fires.
    pub async fn dismiss(&self, id: Uuid) -> bool {
        let mut toasts = self.toasts.lock().await;
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    /// Toasts currently on screen, oldest first.
    pub async fn snapshot(&self) -> Vec<Toast> {
        self.toasts.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.toasts.lock().await.clear();
    }
}
