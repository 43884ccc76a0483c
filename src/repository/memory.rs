use std::sync::Mutex;

use chrono::Utc;

use crate::{
    domain::notification::{CoalescingKey, NewNotification, Notification, NotificationView},
    repository::errors::RepositoryError,
    usecase::contracts::NotificationRepository,
};

struct StoredNotification {
    notification: Notification,
    actors: Vec<i64>,
}

#[derive(Default)]
struct State {
    last_id: i64,
    rows: Vec<StoredNotification>,
}

/// Notification store for the use-case tests. Applies the same coalescing rule
/// as the Postgres upsert.
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    state: Mutex<State>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key_of(notification: &Notification) -> CoalescingKey {
    NewNotification {
        user_id: notification.user_id,
        notification_type: notification.notification_type,
        source_user_id: notification.source_user_id,
        source_post_id: notification.source_post_id,
    }
    .coalescing_key()
}

fn to_view(stored: &StoredNotification) -> NotificationView {
    NotificationView {
        notification: stored.notification.clone(),
        actor_name: None,
        actor_username: None,
        actor_avatar_url: None,
        post_content: None,
        others_total: (stored.actors.len() as i64 - 1).max(0),
    }
}

impl NotificationRepository for InMemoryNotificationRepository {
    async fn create_or_update(&self, candidate: &NewNotification) -> Result<Notification, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let key = candidate.coalescing_key();
        let now = Utc::now();

        if let Some(stored) = state
            .rows
            .iter_mut()
            .find(|s| !s.notification.is_read && key_of(&s.notification) == key)
        {
            stored.notification.source_user_id = candidate.source_user_id;
            stored.notification.updated_at = now;
            stored.notification.is_read = false;
            if !stored.actors.contains(&candidate.source_user_id) {
                stored.actors.push(candidate.source_user_id);
            }
            return Ok(stored.notification.clone());
        }

        state.last_id += 1;
        let notification = Notification {
            id: state.last_id,
            user_id: candidate.user_id,
            notification_type: candidate.notification_type,
            source_user_id: candidate.source_user_id,
            source_post_id: candidate.source_post_id,
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        state.rows.push(StoredNotification {
            notification: notification.clone(),
            actors: vec![candidate.source_user_id],
        });
        Ok(notification)
    }

    async fn find_all(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<NotificationView>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut owned: Vec<&StoredNotification> = state
            .rows
            .iter()
            .filter(|s| s.notification.user_id == user_id)
            .collect();
        owned.sort_by(|a, b| {
            (b.notification.updated_at, b.notification.id).cmp(&(a.notification.updated_at, a.notification.id))
        });

        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(to_view)
            .collect())
    }

    async fn find_by_id(&self, user_id: i64, id: i64) -> Result<Option<NotificationView>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .find(|s| s.notification.user_id == user_id && s.notification.id == id)
            .map(to_view))
    }

    async fn mark_as_read(&self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .rows
            .iter_mut()
            .find(|s| s.notification.user_id == user_id && s.notification.id == id)
            .ok_or(RepositoryError::NotFound)?;
        stored.notification.is_read = true;
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: i64) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;
        for stored in state
            .rows
            .iter_mut()
            .filter(|s| s.notification.user_id == user_id && !s.notification.is_read)
        {
            stored.notification.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.rows.len();
        state
            .rows
            .retain(|s| !(s.notification.user_id == user_id && s.notification.id == id));
        if state.rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count_unread(&self, user_id: i64) -> Result<i64, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .filter(|s| s.notification.user_id == user_id && !s.notification.is_read)
            .count() as i64)
    }
}
