//! Toast notifications with auto-dismiss.
//!
//! Info toasts stay until dismissed unless given a duration; the other kinds
//! disappear after `notifications.default_duration_ms`. Each auto-dismiss is
//! a tokio task that is aborted when its toast is removed early.

use crate::config::NotificationsConfig;
use crate::sync::lock;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    /// Zero means the toast stays until removed.
    pub duration: Duration,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Toasts {
    visible: Vec<Notification>,
    timers: HashMap<String, AbortHandle>,
}

impl Toasts {
    fn remove(&mut self, id: &str) {
        if let Some(timer) = self.timers.remove(id) {
            timer.abort();
        }
        self.visible.retain(|n| n.id != id);
    }
}

#[derive(Clone)]
pub struct NotificationCenter {
    default_duration: Duration,
    toasts: Arc<Mutex<Toasts>>,
}

impl NotificationCenter {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            default_duration: Duration::from_millis(config.default_duration_ms),
            toasts: Arc::default(),
        }
    }

    /// Show a toast and return its id.
    ///
    /// Without an explicit `duration`, info toasts are sticky and the rest
    /// use the configured default.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind, duration: Option<Duration>) -> String {
        let duration = duration.unwrap_or(match kind {
            NotificationKind::Info => Duration::ZERO,
            _ => self.default_duration,
        });
        let notification = Notification {
            id: Ulid::new().to_string(),
            kind,
            message: message.into(),
            duration,
            created_at: Utc::now(),
        };
        let id = notification.id.clone();
        debug!(%id, ?kind, ms = duration.as_millis() as u64, "notification shown");

        let mut toasts = lock(&self.toasts);
        toasts.visible.push(notification);
        if !duration.is_zero() {
            match Handle::try_current() {
                Ok(runtime) => {
                    let state = Arc::clone(&self.toasts);
                    let expired = id.clone();
                    let task = runtime.spawn(async move {
                        tokio::time::sleep(duration).await;
                        let mut toasts = lock(&state);
                        toasts.timers.remove(&expired);
                        toasts.visible.retain(|n| n.id != expired);
                    });
                    toasts.timers.insert(id.clone(), task.abort_handle());
                }
                Err(_) => warn!(%id, "no async runtime, notification will not auto-dismiss"),
            }
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.show(message, NotificationKind::Success, None)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.show(message, NotificationKind::Error, None)
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.show(message, NotificationKind::Info, None)
    }

    pub fn warning(&self, message: impl Into<String>) -> String {
        self.show(message, NotificationKind::Warning, None)
    }

    /// Dismiss one toast and cancel its timer. Unknown ids are ignored.
    pub fn remove(&self, id: &str) {
        lock(&self.toasts).remove(id);
    }

    pub fn remove_all(&self) {
        let mut toasts = lock(&self.toasts);
        for (_, timer) in toasts.timers.drain() {
            timer.abort();
        }
        toasts.visible.clear();
    }

    /// Dismiss everything except info toasts.
    pub fn clear_non_info(&self) {
        let mut toasts = lock(&self.toasts);
        let doomed: Vec<String> = toasts
            .visible
            .iter()
            .filter(|n| n.kind != NotificationKind::Info)
            .map(|n| n.id.clone())
            .collect();
        for id in doomed {
            toasts.remove(&id);
        }
    }

    /// Visible toasts, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.toasts).visible.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center() -> NotificationCenter {
        NotificationCenter::new(&NotificationsConfig::default())
    }

    fn messages(center: &NotificationCenter) -> Vec<String> {
        center.notifications().into_iter().map(|n| n.message).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn success_dismisses_after_default_duration() {
        let center = center();
        center.success("Saved");
        assert_eq!(messages(&center), vec!["Saved"]);

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert_eq!(center.notifications().len(), 1);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(center.notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn info_is_sticky_by_default() {
        let center = center();
        center.info("Heads up");
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(messages(&center), vec!["Heads up"]);
        assert_eq!(center.notifications()[0].duration, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_duration_overrides_default() {
        let center = center();
        center.show("Quick", NotificationKind::Info, Some(Duration::from_millis(100)));
        center.show("Pinned", NotificationKind::Error, Some(Duration::ZERO));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(messages(&center), vec!["Pinned"]);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_cancels_timer() {
        let center = center();
        let id = center.error("Failed");
        center.remove(&id);
        assert!(center.notifications().is_empty());
        assert!(lock(&center.toasts).timers.is_empty());

        // A later toast is not touched by the cancelled timer.
        center.warning("Again");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(messages(&center), vec!["Again"]);
    }

    #[tokio::test]
    async fn clear_non_info_keeps_info() {
        let center = center();
        center.success("a");
        center.info("b");
        center.warning("c");
        center.clear_non_info();
        assert_eq!(messages(&center), vec!["b"]);
    }

    #[tokio::test]
    async fn remove_all_empties() {
        let center = center();
        center.success("a");
        center.info("b");
        center.remove_all();
        assert!(center.notifications().is_empty());
        assert!(lock(&center.toasts).timers.is_empty());
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let center = center();
        let a = center.info("a");
        let b = center.info("a");
        assert_ne!(a, b);
    }

    #[test]
    fn works_without_runtime() {
        let center = center();
        center.success("no timers here");
        assert_eq!(center.notifications().len(), 1);
    }
}
