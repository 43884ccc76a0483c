use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::AppState;
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::notification::NewNotification;
use crate::usecase::error::UsecaseError;

#[derive(Serialize)]
pub struct FollowResponse {
    pub following: bool,
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn follow_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling follow request");

    let created = state.follows_usecase.follow(target_id, user.user_id).await?;

    if created {
        state
            .notifications_usecase
            .notify(NewNotification::new_follower(target_id, user.user_id))
            .await;
    }

    Ok((StatusCode::OK, Json(FollowResponse { following: true })))
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(target_id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling unfollow request");

    state.follows_usecase.unfollow(target_id, user.user_id).await?;
    Ok((StatusCode::OK, Json(FollowResponse { following: false })))
}
