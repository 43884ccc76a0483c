use serde::Serialize;

use crate::domain::post::Post;
use crate::domain::user::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub user: User,
    pub posts: Vec<Post>,
    pub followers_count: i64,
    pub following_count: i64,
}

/// One partial result of the profile fan-in. Each variant owns a disjoint
/// part of [`Profile`], so merge order never matters.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfilePart {
    User(Option<User>),
    Posts(Vec<Post>),
    FollowersCount(i64),
    FollowingCount(i64),
}

#[derive(Debug, Default)]
pub struct ProfileBuilder {
    user: Option<User>,
    posts: Vec<Post>,
    followers_count: i64,
    following_count: i64,
}

impl ProfileBuilder {
    pub fn merge(&mut self, part: ProfilePart) {
        match part {
            ProfilePart::User(user) => self.user = user,
            ProfilePart::Posts(posts) => self.posts = posts,
            ProfilePart::FollowersCount(count) => self.followers_count = count,
            ProfilePart::FollowingCount(count) => self.following_count = count,
        }
    }

    /// Returns `None` when the user record was missing.
    pub fn build(self) -> Option<Profile> {
        let user = self.user?;
        Some(Profile {
            user,
            posts: self.posts,
            followers_count: self.followers_count,
            following_count: self.following_count,
        })
    }
}
