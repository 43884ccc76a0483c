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

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

// The like change is already committed, so a failed count only drops the count.
fn like_response(liked: bool, count: Result<i64, UsecaseError>) -> LikeResponse {
    let count = match count {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "failed to count likes");
            None
        }
    };
    LikeResponse { liked, count }
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling like request");

    let outcome = state.likes_usecase.like_post(post_id, user.user_id).await?;

    // The like is committed; notifying the author is best-effort.
    if outcome.newly_liked {
        state
            .notifications_usecase
            .notify(NewNotification::like(outcome.author_id, user.user_id, post_id))
            .await;
    }

    let count = state.likes_usecase.get_like_count(post_id).await;
    Ok((StatusCode::OK, Json(like_response(true, count))))
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn unlike_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling unlike request");

    state.likes_usecase.unlike_post(post_id, user.user_id).await?;

    let count = state.likes_usecase.get_like_count(post_id).await;
    Ok((StatusCode::OK, Json(like_response(false, count))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_response_carries_count() {
        let response = like_response(true, Ok(3));
        assert_eq!(serde_json::to_value(&response).unwrap(), serde_json::json!({"liked": true, "count": 3}));
    }

    #[test]
    fn test_like_response_survives_count_failure() {
        let response = like_response(false, Err(UsecaseError::Internal("connection reset".to_string())));
        assert_eq!(response.count, None);
        assert_eq!(serde_json::to_value(&response).unwrap(), serde_json::json!({"liked": false}));
    }
}
