use sqlx::types::Json;

use crate::db::models::Question;
use crate::db::types::QuestionType;

const COLUMNS: &str = "\
    id, course_id, order_index, question_type, prompt, choices, \
    correct_answer, marks, created_at, updated_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: &'a str,
    pub(crate) choices: Vec<String>,
    pub(crate) correct_answer: &'a str,
    pub(crate) marks: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, course_id, order_index, question_type, prompt, choices,
            correct_answer, marks, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.order_index)
    .bind(params.question_type)
    .bind(params.prompt)
    .bind(Json(params.choices))
    .bind(params.correct_answer)
    .bind(params.marks)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Questions of a course in presentation order.
pub(crate) async fn list_by_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE course_id = $1
         ORDER BY order_index, created_at, id"
    ))
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn next_order_index(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE course_id = $1",
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}
