use crate::{
    domain::notification::{NewNotification, Notification, NotificationView},
    domain::post::Post,
    domain::user::User,
    repository::errors::RepositoryError,
};

#[cfg_attr(test, mockall::automock)]
pub trait NotificationRepository: Send + Sync {
    /// Coalesces `candidate` into the owner's matching unread notification, or
    /// inserts a new one. Returns the stored row either way.
    async fn create_or_update(&self, candidate: &NewNotification) -> Result<Notification, RepositoryError>;
    async fn find_all(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<NotificationView>, RepositoryError>;
    async fn find_by_id(&self, user_id: i64, id: i64) -> Result<Option<NotificationView>, RepositoryError>;
    async fn mark_as_read(&self, user_id: i64, id: i64) -> Result<(), RepositoryError>;
    async fn mark_all_as_read(&self, user_id: i64) -> Result<u64, RepositoryError>;
    async fn delete(&self, user_id: i64, id: i64) -> Result<(), RepositoryError>;
    async fn count_unread(&self, user_id: i64) -> Result<i64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepositoryError>;
    async fn find_by_author_id(&self, author_id: i64) -> Result<Vec<Post>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait LikeRepository: Send + Sync {
    /// Returns `true` when a new like row was inserted.
    async fn like(&self, post_id: i64, user_id: i64) -> Result<bool, RepositoryError>;
    async fn unlike(&self, post_id: i64, user_id: i64) -> Result<bool, RepositoryError>;
    async fn count_by_post_id(&self, post_id: i64) -> Result<i64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait FollowRepository: Send + Sync {
    /// Returns `true` when a new follow edge was inserted.
    async fn follow(&self, user_id: i64, follower_id: i64) -> Result<bool, RepositoryError>;
    async fn unfollow(&self, user_id: i64, follower_id: i64) -> Result<bool, RepositoryError>;
    async fn count_followers(&self, user_id: i64) -> Result<i64, RepositoryError>;
    async fn count_following(&self, user_id: i64) -> Result<i64, RepositoryError>;
}
