use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::usecase::error::UsecaseError;

#[tracing::instrument(skip(state), fields(user_id = user.user_id))]
pub async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let profile = state.profile_usecase.get_profile(user.user_id).await?;
    Ok((StatusCode::OK, Json(profile)))
}

#[tracing::instrument(skip(state))]
pub async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, UsecaseError> {
    let profile = state.profile_usecase.get_profile(user_id).await?;
    Ok((StatusCode::OK, Json(profile)))
}
