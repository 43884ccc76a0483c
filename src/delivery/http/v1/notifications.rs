use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::notification::NotificationView;
use crate::usecase::error::UsecaseError;

const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize, Validate)]
pub struct NotificationListParams {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationView>,
    pub unread_count: i64,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<NotificationListParams>,
) -> Result<impl IntoResponse, UsecaseError> {
    if let Err(validation_errors) = params.validate() {
        tracing::warn!(?validation_errors, "validation failed");
        return Err(UsecaseError::Validation(format!("{:?}", validation_errors)));
    }

    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);
    tracing::debug!(limit, offset, "listing notifications");

    let notifications = state
        .notifications_usecase
        .list_notifications(user.user_id, limit, offset)
        .await?;
    let unread_count = state.notifications_usecase.count_unread(user.user_id).await?;

    tracing::debug!(count = notifications.len(), unread_count, "notifications listed");
    Ok((
        StatusCode::OK,
        Json(NotificationsListResponse {
            notifications,
            unread_count,
        }),
    ))
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn get_unread_count(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let unread_count = state.notifications_usecase.count_unread(user.user_id).await?;
    Ok((StatusCode::OK, Json(UnreadCountResponse { unread_count })))
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id, notification_id = id))]
pub async fn get_notification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    let notification = state
        .notifications_usecase
        .get_notification(user.user_id, id)
        .await?;
    Ok((StatusCode::OK, Json(notification)))
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id, notification_id = id))]
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    state.notifications_usecase.mark_as_read(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let updated = state.notifications_usecase.mark_all_as_read(user.user_id).await?;
    Ok((StatusCode::OK, Json(MarkAllReadResponse { updated })))
}

#[tracing::instrument(skip(state), fields(user_id = user.user_id, notification_id = id))]
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    state
        .notifications_usecase
        .delete_notification(user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_bounds() {
        let ok = NotificationListParams {
            limit: Some(100),
            offset: Some(0),
        };
        assert!(ok.validate().is_ok());

        let defaults = NotificationListParams {
            limit: None,
            offset: None,
        };
        assert!(defaults.validate().is_ok());

        let too_large = NotificationListParams {
            limit: Some(101),
            offset: None,
        };
        assert!(too_large.validate().is_err());

        let zero = NotificationListParams {
            limit: Some(0),
            offset: None,
        };
        assert!(zero.validate().is_err());

        let negative_offset = NotificationListParams {
            limit: None,
            offset: Some(-1),
        };
        assert!(negative_offset.validate().is_err());
    }
}
