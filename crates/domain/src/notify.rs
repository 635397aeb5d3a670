//! Transient status messages shown one at a time.
//!
//! A new message preempts the visible one and cancels its pending dismissal,
//! so a stale timer can never hide the message that replaced it.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use derive_new::new;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

pub struct NotificationChannel {
    current: Arc<watch::Sender<Option<Notification>>>,
    generation: Arc<AtomicU64>,
    pending_dismiss: Mutex<Option<JoinHandle<()>>>,
    success_ttl: Duration,
    error_ttl: Duration,
}

impl NotificationChannel {
    pub fn new(success_ttl: Duration, error_ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
            generation: Arc::new(AtomicU64::new(0)),
            pending_dismiss: Mutex::new(None),
            success_ttl,
            error_ttl,
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(Notification::new(message.into(), NotificationKind::Success));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(Notification::new(message.into(), NotificationKind::Error));
    }

    pub fn show(&self, notification: Notification) {
        let ttl = match notification.kind {
            NotificationKind::Success => self.success_ttl,
            NotificationKind::Error => self.error_ttl,
        };
        self.show_for(notification, ttl);
    }

    /// Shows `notification` until `ttl` elapses, it is dismissed, or another
    /// message replaces it.
    pub fn show_for(&self, notification: Notification, ttl: Duration) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(kind = ?notification.kind, "Showing notification");

        self.cancel_pending();
        self.current.send_replace(Some(notification));

        // Without a runtime the message stays up until dismissed.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let current = self.current.clone();
        let latest = self.generation.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if latest.load(Ordering::SeqCst) == generation {
                current.send_replace(None);
            }
        });

        if let Ok(mut pending) = self.pending_dismiss.lock() {
            *pending = Some(task);
        }
    }

    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_pending();
        self.current.send_replace(None);
    }

    pub fn current(&self) -> Option<Notification> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.current.subscribe()
    }

    fn cancel_pending(&self) {
        if let Ok(mut pending) = self.pending_dismiss.lock() {
            if let Some(task) = pending.take() {
                task.abort();
            }
        }
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500), Duration::from_millis(3000))
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn channel() -> NotificationChannel {
        NotificationChannel::new(Duration::from_millis(1500), Duration::from_millis(3000))
    }

    #[tokio::test(start_paused = true)]
    async fn success_auto_dismisses() {
        let channel = channel();
        channel.success("Saved");

        sleep(Duration::from_millis(1400)).await;
        assert_eq!(
            channel.current(),
            Some(Notification::new("Saved".to_string(), NotificationKind::Success))
        );

        sleep(Duration::from_millis(200)).await;
        assert_eq!(channel.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_linger_longer() {
        let channel = channel();
        channel.error("Backend down");

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(channel.current().map(|n| n.kind), Some(NotificationKind::Error));

        sleep(Duration::from_millis(1100)).await;
        assert_eq!(channel.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn preempting_cancels_stale_dismiss() {
        let channel = channel();
        channel.success("first");

        sleep(Duration::from_millis(1000)).await;
        channel.success("second");

        // The first message's timer would have fired at 1500ms.
        sleep(Duration::from_millis(800)).await;
        assert_eq!(channel.current().map(|n| n.message), Some("second".to_string()));

        sleep(Duration::from_millis(800)).await;
        assert_eq!(channel.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_dismiss_clears_immediately() {
        let channel = channel();
        let mut rx = channel.subscribe();
        channel.error("oops");
        assert!(rx.borrow_and_update().is_some());

        channel.dismiss();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), None);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(channel.current(), None);
    }

    #[test]
    fn works_without_runtime() {
        let channel = channel();
        channel.success("no timers here");
        assert!(channel.current().is_some());
        channel.dismiss();
        assert!(channel.current().is_none());
    }
}
