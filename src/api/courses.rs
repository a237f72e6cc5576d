use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::course::{
    CourseCreate, CourseResponse, CourseResultResponse, CourseResultsResponse, QuestionCreate,
    QuestionResponse,
};
use crate::schemas::session::{SessionResponse, StartSessionResponse};
use crate::services::{authoring, exam_sessions};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id/questions", get(list_questions).post(add_question))
        .route("/:course_id/sessions", post(start_session))
        .route("/:course_id/results", get(course_results))
}

async fn create_course(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = authoring::create_course(
        state.db(),
        &principal,
        &payload.title,
        payload.time_limit_minutes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn list_courses(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = authoring::list_courses(state.db(), &principal).await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from_listing).collect()))
}

async fn add_question(
    Path(course_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question = authoring::add_question(
        state.db(),
        &principal,
        &course_id,
        authoring::NewQuestion {
            question_type: payload.question_type,
            prompt: payload.prompt,
            choices: payload.choices,
            correct_answer: payload.correct_answer,
            marks: payload.marks,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn list_questions(
    Path(course_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let (_, questions) = authoring::list_questions(state.db(), &principal, &course_id).await?;
    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

async fn start_session(
    Path(course_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let outcome = exam_sessions::start_session(state.db(), &principal, &course_id).await?;

    let status = if outcome.resumed { StatusCode::OK } else { StatusCode::CREATED };
    Ok((
        status,
        Json(StartSessionResponse {
            session: SessionResponse::from_db(outcome.session),
            resumed: outcome.resumed,
        }),
    ))
}

async fn course_results(
    Path(course_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseResultsResponse>, ApiError> {
    let (course, rows) =
        exam_sessions::course_results(state.db(), &principal, &course_id).await?;

    Ok(Json(CourseResultsResponse {
        course: CourseResponse::from_db(course),
        results: rows.into_iter().map(CourseResultResponse::from_db).collect(),
    }))
}
