use sqlx::PgPool;

use crate::db::models::{CourseResultRow, ExamResult};

const COLUMNS: &str = "\
    session_id, student_id, course_id, score, total_marks, percentage, achieved_at, updated_at";

pub(crate) struct UpsertResult<'a> {
    pub(crate) session_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
    pub(crate) now: time::PrimitiveDateTime,
}

/// `achieved_at` is written on insert only; a rescore keeps the original value.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertResult<'_>,
) -> Result<ExamResult, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "INSERT INTO results (
            session_id, student_id, course_id, score, total_marks, percentage,
            achieved_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        ON CONFLICT (session_id) DO UPDATE
        SET score = EXCLUDED.score,
            total_marks = EXCLUDED.total_marks,
            percentage = EXCLUDED.percentage,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}"
    ))
    .bind(params.session_id)
    .bind(params.student_id)
    .bind(params.course_id)
    .bind(params.score)
    .bind(params.total_marks)
    .bind(params.percentage)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM results WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<CourseResultRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseResultRow>(
        "SELECT r.session_id, r.student_id, u.username AS student_username,
                u.full_name AS student_name, r.score, r.total_marks, r.percentage,
                s.completion_mode, r.achieved_at
         FROM results r
         JOIN users u ON u.id = r.student_id
         JOIN exam_sessions s ON s.id = r.session_id
         WHERE r.course_id = $1
         ORDER BY r.achieved_at DESC, r.session_id",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}
