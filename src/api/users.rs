use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::schemas::user::UserResponse;
use crate::services::approval;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/:user_id/approve", post(approve_user))
}

async fn list_pending(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = approval::pending_teachers(state.db(), &admin).await?;
    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn approve_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = approval::approve_teacher(state.db(), &admin, &user_id).await?;
    Ok(Json(UserResponse::from_db(user)))
}
