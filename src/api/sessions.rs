use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::schemas::session::{
    AnswersRequest, DraftSaveResponse, HistoryItem, HistoryQuery, ResultDetailResponse,
    SessionDetailResponse, SubmitResponse,
};
use crate::services::exam_sessions;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_history))
        .route("/:session_id", get(resume_session))
        .route("/:session_id/answers", put(save_answers))
        .route("/:session_id/submit", post(submit_answers))
        .route("/:session_id/result", get(session_result))
}

async fn list_history(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<PaginatedResponse<HistoryItem>>, ApiError> {
    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 1000);
    let (rows, total_count) = exam_sessions::history(state.db(), &principal, skip, limit).await?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(HistoryItem::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn resume_session(
    Path(session_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let view = exam_sessions::resume_session(state.db(), &principal, &session_id).await?;
    Ok(Json(SessionDetailResponse::from_view(view)))
}

async fn save_answers(
    Path(session_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswersRequest>,
) -> Result<Json<DraftSaveResponse>, ApiError> {
    let outcome = exam_sessions::save_answers(
        state.db(),
        &principal,
        &session_id,
        payload.answers,
        state.settings().exam().max_answer_chars,
    )
    .await?;

    Ok(Json(DraftSaveResponse {
        saved: outcome.saved,
        remaining_seconds: outcome.remaining_seconds,
    }))
}

async fn submit_answers(
    Path(session_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswersRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let outcome = exam_sessions::submit_answers(
        state.db(),
        &principal,
        &session_id,
        payload.answers,
        state.settings().exam().max_answer_chars,
    )
    .await?;

    Ok(Json(SubmitResponse::from_outcome(outcome)))
}

async fn session_result(
    Path(session_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ResultDetailResponse>, ApiError> {
    let view = exam_sessions::session_result(state.db(), &principal, &session_id).await?;
    Ok(Json(ResultDetailResponse::from_view(view)))
}

#[cfg(test)]
mod tests;
