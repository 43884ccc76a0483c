use futures::stream::{FuturesUnordered, StreamExt};

use crate::domain::profile::{Profile, ProfileBuilder, ProfilePart};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::{FollowRepository, PostRepository, UserRepository};
use crate::usecase::error::UsecaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    User,
    Posts,
    FollowersCount,
    FollowingCount,
}

const PARTS: [PartKind; 4] = [
    PartKind::User,
    PartKind::Posts,
    PartKind::FollowersCount,
    PartKind::FollowingCount,
];

pub struct ProfileUseCase<U, P, F>
where
    U: UserRepository,
    P: PostRepository,
    F: FollowRepository,
{
    user_repository: U,
    post_repository: P,
    follow_repository: F,
}

impl<U, P, F> ProfileUseCase<U, P, F>
where
    U: UserRepository,
    P: PostRepository,
    F: FollowRepository,
{
    pub fn new(user_repository: U, post_repository: P, follow_repository: F) -> Self {
        Self {
            user_repository,
            post_repository,
            follow_repository,
        }
    }

    async fn fetch_part(&self, kind: PartKind, user_id: i64) -> Result<ProfilePart, RepositoryError> {
        match kind {
            PartKind::User => self.user_repository.find_by_id(user_id).await.map(ProfilePart::User),
            PartKind::Posts => self
                .post_repository
                .find_by_author_id(user_id)
                .await
                .map(ProfilePart::Posts),
            PartKind::FollowersCount => self
                .follow_repository
                .count_followers(user_id)
                .await
                .map(ProfilePart::FollowersCount),
            PartKind::FollowingCount => self
                .follow_repository
                .count_following(user_id)
                .await
                .map(ProfilePart::FollowingCount),
        }
    }

    /// Runs the four profile reads concurrently and merges them as they
    /// complete. The first failure is returned immediately; dropping the
    /// pending set cancels the reads still in flight.
    #[tracing::instrument(skip(self))]
    pub async fn get_profile(&self, user_id: i64) -> Result<Profile, UsecaseError> {
        tracing::debug!("assembling profile");

        let mut pending: FuturesUnordered<_> = PARTS
            .into_iter()
            .map(|kind| async move { (kind, self.fetch_part(kind, user_id).await) })
            .collect();

        let mut builder = ProfileBuilder::default();
        let mut completed = 0;
        while let Some((kind, result)) = pending.next().await {
            match result {
                Ok(part) => {
                    completed += 1;
                    builder.merge(part);
                }
                Err(e) => {
                    tracing::error!(?kind, error = %e, in_flight = pending.len(), "profile read failed");
                    return Err(e.into());
                }
            }
        }
        debug_assert_eq!(completed, PARTS.len());

        let profile = builder
            .build()
            .ok_or_else(|| UsecaseError::NotFound("User".to_string()))?;

        tracing::debug!(
            posts = profile.posts.len(),
            followers = profile.followers_count,
            following = profile.following_count,
            "profile assembled"
        );
        Ok(profile)
    }
}
