use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::ExamError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_question_ids: Option<Vec<String>>,
}

impl ErrorResponse {
    fn new(status: StatusCode, detail: String) -> Self {
        Self { status: status.as_u16(), detail, missing_question_ids: None }
    }
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable { detail: String, missing: Vec<String> },
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<ExamError> for ApiError {
    fn from(err: ExamError) -> Self {
        let detail = err.to_string();
        match err {
            ExamError::IncompleteSubmission { missing } => Self::Unprocessable { detail, missing },
            ExamError::NoQuestions
            | ExamError::UnknownQuestion(_)
            | ExamError::AnswerTooLong { .. }
            | ExamError::DeadlinePassed
            | ExamError::NotCompleted
            | ExamError::InvalidCourse(_)
            | ExamError::InvalidQuestion(_)
            | ExamError::NotTeacher => Self::BadRequest(detail),
            ExamError::NotOwner
            | ExamError::NotStudent
            | ExamError::NotAuthor
            | ExamError::NotCourseOwner
            | ExamError::NotAdmin => Self::Forbidden(detail),
            ExamError::CourseNotFound | ExamError::SessionNotFound | ExamError::UserNotFound => {
                Self::NotFound(detail)
            }
            ExamError::ScoreOverflow => Self::internal(detail, "Failed to score session"),
            ExamError::AlreadyCompleted | ExamError::SessionConflict => Self::Conflict(detail),
            ExamError::Database(db_err) if is_unique_violation(&db_err) => {
                tracing::warn!(error = %db_err, "Concurrent write rejected by unique constraint");
                Self::Conflict("Request conflicts with a concurrent change".to_string())
            }
            ExamError::Database(db_err) => Self::internal(db_err, "Database operation failed"),
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response =
                    (status, Json(ErrorResponse::new(status, message.to_string()))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Unprocessable { detail, missing } => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let body = ErrorResponse {
                    status: status.as_u16(),
                    detail,
                    missing_question_ids: Some(missing),
                };
                (status, Json(body)).into_response()
            }
            ApiError::TooManyRequests(message) => {
                let status = StatusCode::TOO_MANY_REQUESTS;
                (status, Json(ErrorResponse::new(status, message.to_string()))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
        }
    }
}
