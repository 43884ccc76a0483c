use sqlx::PgPool;

use crate::{
    domain::notification::{NewNotification, Notification, NotificationView},
    repository::errors::RepositoryError,
    usecase::contracts::NotificationRepository,
};

// Both upserts run as one statement: the ON CONFLICT target is one of the two
// partial unique indexes over unread rows, and the actor is recorded in the
// same CTE so `others_total` can never miss a coalesced event.
const UPSERT_POST_SCOPED: &str = r#"
    WITH upserted AS (
        INSERT INTO notifications (user_id, type, source_user_id, source_post_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, type, source_post_id)
            WHERE is_read = FALSE AND source_post_id IS NOT NULL
        DO UPDATE SET source_user_id = EXCLUDED.source_user_id,
                      updated_at = NOW(),
                      is_read = FALSE
        RETURNING id, user_id, type, source_user_id, source_post_id, is_read, created_at, updated_at
    ), recorded AS (
        INSERT INTO notification_actors (notification_id, actor_id)
        SELECT id, source_user_id FROM upserted
        ON CONFLICT (notification_id, actor_id) DO UPDATE SET last_seen_at = NOW()
    )
    SELECT id, user_id, type, source_user_id, source_post_id, is_read, created_at, updated_at
    FROM upserted
"#;

const UPSERT_USER_SCOPED: &str = r#"
    WITH upserted AS (
        INSERT INTO notifications (user_id, type, source_user_id, source_post_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, type)
            WHERE is_read = FALSE AND source_post_id IS NULL
        DO UPDATE SET source_user_id = EXCLUDED.source_user_id,
                      updated_at = NOW(),
                      is_read = FALSE
        RETURNING id, user_id, type, source_user_id, source_post_id, is_read, created_at, updated_at
    ), recorded AS (
        INSERT INTO notification_actors (notification_id, actor_id)
        SELECT id, source_user_id FROM upserted
        ON CONFLICT (notification_id, actor_id) DO UPDATE SET last_seen_at = NOW()
    )
    SELECT id, user_id, type, source_user_id, source_post_id, is_read, created_at, updated_at
    FROM upserted
"#;

const SELECT_VIEW: &str = r#"
    SELECT n.id, n.user_id, n.type, n.source_user_id, n.source_post_id,
           n.is_read, n.created_at, n.updated_at,
           u.name AS actor_name,
           u.username AS actor_username,
           u.avatar_url AS actor_avatar_url,
           LEFT(p.content, 140) AS post_content,
           GREATEST(
               (SELECT COUNT(*) FROM notification_actors a WHERE a.notification_id = n.id) - 1,
               0
           ) AS others_total
    FROM notifications n
    LEFT JOIN users u ON u.id = n.source_user_id
    LEFT JOIN posts p ON p.id = n.source_post_id
"#;

pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip(self, candidate), fields(user_id = candidate.user_id, notification_type = %candidate.notification_type))]
    async fn create_or_update(&self, candidate: &NewNotification) -> Result<Notification, RepositoryError> {
        tracing::debug!("upserting notification");

        let statement = if candidate.notification_type.is_post_scoped() {
            UPSERT_POST_SCOPED
        } else {
            UPSERT_USER_SCOPED
        };

        let notification = sqlx::query_as::<_, Notification>(statement)
            .bind(candidate.user_id)
            .bind(candidate.notification_type.as_str())
            .bind(candidate.source_user_id)
            .bind(candidate.source_post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(notification_id = notification.id, "notification upserted");
        Ok(notification)
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<NotificationView>, RepositoryError> {
        tracing::debug!("finding notifications");

        let query = format!(
            "{SELECT_VIEW} WHERE n.user_id = $1 ORDER BY n.updated_at DESC, n.id DESC LIMIT $2 OFFSET $3"
        );
        let notifications = sqlx::query_as::<_, NotificationView>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(user_id, count = notifications.len(), "found notifications");
        Ok(notifications)
    }

    #[tracing::instrument(skip(self), fields(notification_id = id))]
    async fn find_by_id(&self, user_id: i64, id: i64) -> Result<Option<NotificationView>, RepositoryError> {
        tracing::debug!("finding notification by id");

        let query = format!("{SELECT_VIEW} WHERE n.user_id = $1 AND n.id = $2");
        let notification = sqlx::query_as::<_, NotificationView>(&query)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(notification)
    }

    #[tracing::instrument(skip(self), fields(notification_id = id))]
    async fn mark_as_read(&self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        tracing::debug!("marking notification as read");

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND id = $2
            "#
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // Postgres reports matched rows, so an already-read row still counts.
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_all_as_read(&self, user_id: i64) -> Result<u64, RepositoryError> {
        tracing::debug!("marking all notifications as read");

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND is_read = FALSE
            "#
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(user_id, updated = result.rows_affected(), "notifications marked as read");
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(notification_id = id))]
    async fn delete(&self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        tracing::debug!("deleting notification");

        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE user_id = $1 AND id = $2
            "#
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(notification_id = id, "notification deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn count_unread(&self, user_id: i64) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            "#
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(count)
    }
}
