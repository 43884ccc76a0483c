mod notification;

pub use notification::PostgresNotificationRepository;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    domain::post::Post,
    domain::user::User,
    repository::errors::RepositoryError,
    usecase::contracts::{FollowRepository, LikeRepository, PostRepository, UserRepository},
};

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip(self), fields(user_id = id))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        tracing::debug!("finding user by id");

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, avatar_url, bio, created_at
            FROM users
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(user)
    }
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PostRepository for PostgresPostRepository {
    #[tracing::instrument(skip(self), fields(post_id = id))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepositoryError> {
        tracing::debug!("finding post by id");

        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at
            FROM posts
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(post)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_author_id(&self, author_id: i64) -> Result<Vec<Post>, RepositoryError> {
        tracing::debug!("finding posts by author");

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(author_id, count = posts.len(), "found posts");
        Ok(posts)
    }
}

pub struct PostgresLikeRepository {
    pool: PgPool,
}

impl PostgresLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LikeRepository for PostgresLikeRepository {
    #[tracing::instrument(skip(self))]
    async fn like(&self, post_id: i64, user_id: i64) -> Result<bool, RepositoryError> {
        tracing::debug!("liking post");

        let result = sqlx::query(
            r#"
            INSERT INTO likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn unlike(&self, post_id: i64, user_id: i64) -> Result<bool, RepositoryError> {
        tracing::debug!("unliking post");

        let result = sqlx::query(
            r#"
            DELETE FROM likes
            WHERE post_id = $1 AND user_id = $2
            "#
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn count_by_post_id(&self, post_id: i64) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM likes
            WHERE post_id = $1
            "#
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(count)
    }
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl FollowRepository for PostgresFollowRepository {
    #[tracing::instrument(skip(self))]
    async fn follow(&self, user_id: i64, follower_id: i64) -> Result<bool, RepositoryError> {
        tracing::debug!("following user");

        let result = sqlx::query(
            r#"
            INSERT INTO followers (user_id, follower_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, follower_id) DO NOTHING
            "#
        )
        .bind(user_id)
        .bind(follower_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn unfollow(&self, user_id: i64, follower_id: i64) -> Result<bool, RepositoryError> {
        tracing::debug!("unfollowing user");

        let result = sqlx::query(
            r#"
            DELETE FROM followers
            WHERE user_id = $1 AND follower_id = $2
            "#
        )
        .bind(user_id)
        .bind(follower_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn count_followers(&self, user_id: i64) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn count_following(&self, user_id: i64) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(count)
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
