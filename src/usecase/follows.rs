use crate::usecase::contracts::{FollowRepository, UserRepository};
use crate::usecase::error::UsecaseError;

pub struct FollowsUseCase<F, U>
where
    F: FollowRepository,
    U: UserRepository,
{
    follow_repository: F,
    user_repository: U,
}

impl<F, U> FollowsUseCase<F, U>
where
    F: FollowRepository,
    U: UserRepository,
{
    pub fn new(follow_repository: F, user_repository: U) -> Self {
        Self {
            follow_repository,
            user_repository,
        }
    }

    /// Makes `follower_id` follow `target_id`. Returns `true` when the edge is
    /// new; following someone twice is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn follow(&self, target_id: i64, follower_id: i64) -> Result<bool, UsecaseError> {
        if target_id == follower_id {
            return Err(UsecaseError::Validation("Cannot follow yourself".to_string()));
        }

        self.user_repository
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("User".to_string()))?;

        let created = self.follow_repository.follow(target_id, follower_id).await?;
        if created {
            tracing::info!("follow added");
        } else {
            tracing::debug!("already following");
        }
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn unfollow(&self, target_id: i64, follower_id: i64) -> Result<bool, UsecaseError> {
        let removed = self.follow_repository.unfollow(target_id, follower_id).await?;
        if removed {
            tracing::info!("follow removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::User;
    use crate::usecase::contracts::{MockFollowRepository, MockUserRepository};

    fn make_user(id: i64) -> User {
        User {
            id,
            name: "Grace".to_string(),
            username: "grace".to_string(),
            email: "grace@example.com".to_string(),
            avatar_url: None,
            bio: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_follow_creates_edge() {
        let mut mock_follow_repo = MockFollowRepository::new();
        let mut mock_user_repo = MockUserRepository::new();

        mock_user_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(2))
            .times(1)
            .returning(|id| Ok(Some(make_user(id))));
        mock_follow_repo
            .expect_follow()
            .with(mockall::predicate::eq(2), mockall::predicate::eq(1))
            .times(1)
            .returning(|_, _| Ok(true));

        let usecase = FollowsUseCase::new(mock_follow_repo, mock_user_repo);
        assert!(usecase.follow(2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_self_is_rejected() {
        let usecase = FollowsUseCase::new(MockFollowRepository::new(), MockUserRepository::new());
        let result = usecase.follow(1, 1).await;

        assert!(matches!(result, Err(UsecaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let mut mock_user_repo = MockUserRepository::new();
        mock_user_repo.expect_find_by_id().times(1).returning(|_| Ok(None));

        let usecase = FollowsUseCase::new(MockFollowRepository::new(), mock_user_repo);
        let result = usecase.follow(99, 1).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_missing_edge() {
        let mut mock_follow_repo = MockFollowRepository::new();
        mock_follow_repo.expect_unfollow().times(1).returning(|_, _| Ok(false));

        let usecase = FollowsUseCase::new(mock_follow_repo, MockUserRepository::new());
        assert!(!usecase.unfollow(2, 1).await.unwrap());
    }
}
