use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;

use crate::domain::notification::Notification;
use crate::usecase::connections::ConnectionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The recipient has no live session; the notification stays in the store.
    NotConnected,
    /// `pushed` sessions accepted the notification, `dropped` did not.
    Delivered { pushed: usize, dropped: usize },
}

/// Best-effort push of stored notifications to their owner's live sessions.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Never waits: a session whose queue is full or already closed simply
    /// misses this notification.
    #[tracing::instrument(skip(self, notification), fields(notification_id = notification.id))]
    pub fn deliver(&self, user_id: i64, notification: &Notification) -> DeliveryOutcome {
        let senders = self.registry.lookup(user_id);
        if senders.is_empty() {
            tracing::debug!("recipient not connected, notification left for polling");
            metrics::counter!("notifications_not_connected_total").increment(1);
            return DeliveryOutcome::NotConnected;
        }

        let mut pushed = 0;
        let mut dropped = 0;
        for sender in senders {
            match sender.try_send(notification.clone()) {
                Ok(()) => pushed += 1,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    tracing::warn!("session queue full, dropping notification");
                    metrics::counter!("notifications_dropped_total", "reason" => "buffer_full").increment(1);
                }
                Err(TrySendError::Closed(_)) => {
                    dropped += 1;
                    tracing::debug!("session closed before delivery");
                    metrics::counter!("notifications_dropped_total", "reason" => "session_closed").increment(1);
                }
            }
        }

        if pushed > 0 {
            metrics::counter!("notifications_pushed_total").increment(pushed as u64);
        }
        tracing::debug!(pushed, dropped, "notification dispatched");
        DeliveryOutcome::Delivered { pushed, dropped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::notification::NotificationType;
    use crate::usecase::connections::RegistrySettings;

    fn notification(id: i64, user_id: i64) -> Notification {
        let now = Utc::now();
        Notification {
            id,
            user_id,
            notification_type: NotificationType::Like,
            source_user_id: 99,
            source_post_id: Some(5),
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn setup(buffer_size: usize) -> (Arc<ConnectionRegistry>, NotificationDispatcher) {
        let registry = Arc::new(ConnectionRegistry::new(RegistrySettings {
            buffer_size,
            max_sessions_per_user: 5,
        }));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        (registry, dispatcher)
    }

    #[test]
    fn test_deliver_without_session_is_not_connected() {
        let (_registry, dispatcher) = setup(4);
        assert_eq!(dispatcher.deliver(1, &notification(1, 1)), DeliveryOutcome::NotConnected);
    }

    #[tokio::test]
    async fn test_deliver_preserves_submission_order() {
        let (registry, dispatcher) = setup(4);
        let (_guard, mut rx) = registry.register(1);

        dispatcher.deliver(1, &notification(10, 1));
        dispatcher.deliver(1, &notification(11, 1));

        assert_eq!(rx.recv().await.unwrap().id, 10);
        assert_eq!(rx.recv().await.unwrap().id, 11);
    }

    #[tokio::test]
    async fn test_deliver_fans_out_to_every_session() {
        let (registry, dispatcher) = setup(4);
        let (_g1, mut rx1) = registry.register(1);
        let (_g2, mut rx2) = registry.register(1);

        let outcome = dispatcher.deliver(1, &notification(3, 1));

        assert_eq!(outcome, DeliveryOutcome::Delivered { pushed: 2, dropped: 0 });
        assert_eq!(rx1.recv().await.unwrap().id, 3);
        assert_eq!(rx2.recv().await.unwrap().id, 3);
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (registry, dispatcher) = setup(1);
        // Nobody drains this receiver.
        let (_guard, _rx) = registry.register(1);

        let first = dispatcher.deliver(1, &notification(1, 1));
        let second = dispatcher.deliver(1, &notification(2, 1));

        assert_eq!(first, DeliveryOutcome::Delivered { pushed: 1, dropped: 0 });
        assert_eq!(second, DeliveryOutcome::Delivered { pushed: 0, dropped: 1 });
    }

    #[test]
    fn test_closed_session_counts_as_dropped() {
        let (registry, dispatcher) = setup(4);
        let (_guard, rx) = registry.register(1);
        drop(rx);

        let outcome = dispatcher.deliver(1, &notification(1, 1));
        assert_eq!(outcome, DeliveryOutcome::Delivered { pushed: 0, dropped: 1 });
    }

    #[test]
    fn test_deliver_only_reaches_recipient() {
        let (registry, dispatcher) = setup(4);
        let (_guard, mut rx) = registry.register(2);

        assert_eq!(dispatcher.deliver(1, &notification(1, 1)), DeliveryOutcome::NotConnected);
        assert!(rx.try_recv().is_err());
    }
}
