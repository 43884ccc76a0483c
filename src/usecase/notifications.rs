use crate::domain::notification::{NewNotification, Notification, NotificationView};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::NotificationRepository;
use crate::usecase::delivery::{DeliveryOutcome, NotificationDispatcher};
use crate::usecase::error::UsecaseError;

pub struct NotificationsUseCase<N>
where
    N: NotificationRepository,
{
    notification_repository: N,
    dispatcher: NotificationDispatcher,
}

fn not_found(e: RepositoryError) -> UsecaseError {
    match e {
        RepositoryError::NotFound => UsecaseError::NotFound("Notification".to_string()),
        other => other.into(),
    }
}

impl<N> NotificationsUseCase<N>
where
    N: NotificationRepository,
{
    pub fn new(notification_repository: N, dispatcher: NotificationDispatcher) -> Self {
        Self {
            notification_repository,
            dispatcher,
        }
    }

    #[tracing::instrument(skip(self, candidate), fields(user_id = candidate.user_id, notification_type = %candidate.notification_type, source_user_id = candidate.source_user_id))]
    pub async fn create_or_update(&self, candidate: &NewNotification) -> Result<Notification, UsecaseError> {
        tracing::debug!(key = ?candidate.coalescing_key(), "creating or coalescing notification");

        candidate.validate().map_err(UsecaseError::Validation)?;
        let notification = self.notification_repository.create_or_update(candidate).await?;

        tracing::info!(notification_id = notification.id, "notification stored");
        Ok(notification)
    }

    /// Entry point for event producers: stores the notification, then pushes it
    /// to the owner's live sessions. Failures are logged and never reach the
    /// caller, whose own action has already been committed.
    #[tracing::instrument(skip(self, candidate), fields(user_id = candidate.user_id, notification_type = %candidate.notification_type))]
    pub async fn notify(&self, candidate: NewNotification) -> Option<DeliveryOutcome> {
        if candidate.user_id == candidate.source_user_id {
            tracing::debug!("actor is the recipient, skipping notification");
            return None;
        }

        let notification = match self.create_or_update(&candidate).await {
            Ok(notification) => notification,
            Err(e) => {
                tracing::error!(error = %e, "failed to store notification");
                metrics::counter!("notifications_store_failures_total").increment(1);
                return None;
            }
        };

        // Push only after the store write has completed.
        Some(self.dispatcher.deliver(notification.user_id, &notification))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_notifications(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationView>, UsecaseError> {
        tracing::debug!("listing notifications");

        let notifications = self.notification_repository.find_all(user_id, limit, offset).await?;

        tracing::debug!(user_id, count = notifications.len(), "retrieved notifications");
        Ok(notifications)
    }

    #[tracing::instrument(skip(self), fields(notification_id = id))]
    pub async fn get_notification(&self, user_id: i64, id: i64) -> Result<NotificationView, UsecaseError> {
        tracing::debug!("getting notification");

        self.notification_repository
            .find_by_id(user_id, id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Notification".to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_unread(&self, user_id: i64) -> Result<i64, UsecaseError> {
        tracing::debug!("counting unread notifications");

        let count = self.notification_repository.count_unread(user_id).await?;

        tracing::debug!(user_id, count, "unread count retrieved");
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(notification_id = id))]
    pub async fn mark_as_read(&self, user_id: i64, id: i64) -> Result<(), UsecaseError> {
        tracing::debug!("marking notification as read");

        self.notification_repository
            .mark_as_read(user_id, id)
            .await
            .map_err(not_found)?;

        tracing::debug!(notification_id = id, "notification marked as read");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_all_as_read(&self, user_id: i64) -> Result<u64, UsecaseError> {
        tracing::debug!("marking all notifications as read");

        let updated = self.notification_repository.mark_all_as_read(user_id).await?;

        tracing::debug!(user_id, updated, "all notifications marked as read");
        Ok(updated)
    }

    /// Only the owner can delete; another user's notification is reported as
    /// missing.
    #[tracing::instrument(skip(self), fields(notification_id = id))]
    pub async fn delete_notification(&self, user_id: i64, id: i64) -> Result<(), UsecaseError> {
        tracing::debug!("deleting notification");

        self.notification_repository
            .delete(user_id, id)
            .await
            .map_err(not_found)?;

        tracing::info!(notification_id = id, user_id, "notification deleted");
        Ok(())
    }
}
