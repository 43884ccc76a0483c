use crate::usecase::contracts::{LikeRepository, PostRepository};
use crate::usecase::error::UsecaseError;

/// Result of liking a post. `author_id` is the post owner, the recipient of
/// the like notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub newly_liked: bool,
    pub author_id: i64,
}

pub struct LikesUseCase<L, P>
where
    L: LikeRepository,
    P: PostRepository,
{
    like_repository: L,
    post_repository: P,
}

impl<L, P> LikesUseCase<L, P>
where
    L: LikeRepository,
    P: PostRepository,
{
    pub fn new(like_repository: L, post_repository: P) -> Self {
        Self {
            like_repository,
            post_repository,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn like_post(&self, post_id: i64, user_id: i64) -> Result<LikeOutcome, UsecaseError> {
        tracing::debug!("liking post");

        let post = self
            .post_repository
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Post".to_string()))?;

        let newly_liked = self.like_repository.like(post_id, user_id).await?;
        if newly_liked {
            tracing::info!(author_id = post.author_id, "like added");
        } else {
            tracing::debug!("post already liked");
        }

        Ok(LikeOutcome {
            newly_liked,
            author_id: post.author_id,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn unlike_post(&self, post_id: i64, user_id: i64) -> Result<bool, UsecaseError> {
        tracing::debug!("unliking post");

        self.post_repository
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Post".to_string()))?;

        let removed = self.like_repository.unlike(post_id, user_id).await?;
        if removed {
            tracing::info!("like removed");
        }
        Ok(removed)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_like_count(&self, post_id: i64) -> Result<i64, UsecaseError> {
        let count = self.like_repository.count_by_post_id(post_id).await?;
        tracing::debug!(count, "like count retrieved");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::Post;
    use crate::repository::errors::RepositoryError;
    use crate::usecase::contracts::{MockLikeRepository, MockPostRepository};

    fn make_post(id: i64, author_id: i64) -> Post {
        Post {
            id,
            author_id,
            title: "Test".to_string(),
            content: "body".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_like_post_returns_author() {
        let mut mock_like_repo = MockLikeRepository::new();
        let mut mock_post_repo = MockPostRepository::new();

        mock_post_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(10))
            .times(1)
            .returning(|id| Ok(Some(make_post(id, 3))));

        mock_like_repo
            .expect_like()
            .with(mockall::predicate::eq(10), mockall::predicate::eq(7))
            .times(1)
            .returning(|_, _| Ok(true));

        let usecase = LikesUseCase::new(mock_like_repo, mock_post_repo);
        let outcome = usecase.like_post(10, 7).await.unwrap();

        assert_eq!(
            outcome,
            LikeOutcome {
                newly_liked: true,
                author_id: 3
            }
        );
    }

    #[tokio::test]
    async fn test_like_post_twice_is_not_new() {
        let mut mock_like_repo = MockLikeRepository::new();
        let mut mock_post_repo = MockPostRepository::new();

        mock_post_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(make_post(id, 3))));
        mock_like_repo.expect_like().times(1).returning(|_, _| Ok(false));

        let usecase = LikesUseCase::new(mock_like_repo, mock_post_repo);
        let outcome = usecase.like_post(10, 7).await.unwrap();

        assert!(!outcome.newly_liked);
    }

    #[tokio::test]
    async fn test_like_post_not_found() {
        let mock_like_repo = MockLikeRepository::new();
        let mut mock_post_repo = MockPostRepository::new();

        mock_post_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(404))
            .times(1)
            .returning(|_| Ok(None));

        let usecase = LikesUseCase::new(mock_like_repo, mock_post_repo);
        let result = usecase.like_post(404, 7).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_post_database_error_is_internal() {
        let mut mock_like_repo = MockLikeRepository::new();
        let mut mock_post_repo = MockPostRepository::new();

        mock_post_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(make_post(id, 3))));
        mock_like_repo
            .expect_like()
            .returning(|_, _| Err(RepositoryError::DatabaseError("deadlock".to_string())));

        let usecase = LikesUseCase::new(mock_like_repo, mock_post_repo);
        let result = usecase.like_post(10, 7).await;

        assert!(matches!(result, Err(UsecaseError::Internal(_))));
    }

    #[tokio::test]
    async fn test_unlike_post() {
        let mut mock_like_repo = MockLikeRepository::new();
        let mut mock_post_repo = MockPostRepository::new();

        mock_post_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(make_post(id, 3))));
        mock_like_repo
            .expect_unlike()
            .with(mockall::predicate::eq(10), mockall::predicate::eq(7))
            .times(1)
            .returning(|_, _| Ok(true));

        let usecase = LikesUseCase::new(mock_like_repo, mock_post_repo);
        assert!(usecase.unlike_post(10, 7).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_like_count() {
        let mut mock_like_repo = MockLikeRepository::new();
        let mock_post_repo = MockPostRepository::new();

        mock_like_repo
            .expect_count_by_post_id()
            .with(mockall::predicate::eq(10))
            .times(1)
            .returning(|_| Ok(5));

        let usecase = LikesUseCase::new(mock_like_repo, mock_post_repo);
        assert_eq!(usecase.get_like_count(10).await.unwrap(), 5);
    }
}
