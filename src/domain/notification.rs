use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    NewFollower,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::NewFollower => "new_follower",
        }
    }

    /// Post-scoped types coalesce per (owner, type, post) instead of per (owner, type).
    pub fn is_post_scoped(&self) -> bool {
        matches!(self, NotificationType::Like)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NotificationType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "like" => Ok(NotificationType::Like),
            "new_follower" => Ok(NotificationType::NewFollower),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub source_user_id: i64,
    pub source_post_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A notification as returned to its owner, joined with actor and post metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: Notification,
    pub actor_name: Option<String>,
    pub actor_username: Option<String>,
    pub actor_avatar_url: Option<String>,
    pub post_content: Option<String>,
    pub others_total: i64,
}

/// Candidate submitted by an event producer; either coalesced into the
/// owner's unread notification with the same key or inserted as a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub source_user_id: i64,
    pub source_post_id: Option<i64>,
}

/// The identity under which unread notifications are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoalescingKey {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub source_post_id: Option<i64>,
}

impl NewNotification {
    pub fn like(owner_id: i64, actor_id: i64, post_id: i64) -> Self {
        Self {
            user_id: owner_id,
            notification_type: NotificationType::Like,
            source_user_id: actor_id,
            source_post_id: Some(post_id),
        }
    }

    pub fn new_follower(owner_id: i64, actor_id: i64) -> Self {
        Self {
            user_id: owner_id,
            notification_type: NotificationType::NewFollower,
            source_user_id: actor_id,
            source_post_id: None,
        }
    }

    pub fn coalescing_key(&self) -> CoalescingKey {
        CoalescingKey {
            user_id: self.user_id,
            notification_type: self.notification_type,
            source_post_id: if self.notification_type.is_post_scoped() {
                self.source_post_id
            } else {
                None
            },
        }
    }

    /// Post-scoped types must name a post; the others must not.
    pub fn validate(&self) -> Result<(), String> {
        match (self.notification_type.is_post_scoped(), self.source_post_id) {
            (true, None) => Err(format!(
                "{} notification requires a source post",
                self.notification_type
            )),
            (false, Some(_)) => Err(format!(
                "{} notification cannot reference a post",
                self.notification_type
            )),
            _ => Ok(()),
        }
    }
}
