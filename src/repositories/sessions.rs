use sqlx::PgPool;

use crate::db::models::{ExamSession, SessionHistoryRow};
use crate::db::types::CompletionMode;

pub(crate) const COLUMNS: &str = "\
    id, student_id, course_id, started_at, is_completed, completed_at, \
    completion_mode, score, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row-locks the session until the surrounding transaction ends.
pub(crate) async fn find_by_id_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_open(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions
         WHERE student_id = $1 AND course_id = $2 AND NOT is_completed"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

/// Serializes concurrent starts for one (student, course) pair.
pub(crate) async fn acquire_student_course_lock(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("exam_session:{student_id}:{course_id}"))
        .execute(executor)
        .await?;
    Ok(())
}

/// Returns `false` when another open session already exists for the pair.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_sessions (
            id, student_id, course_id, started_at, is_completed, score, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,FALSE,0,$5,$5)
        ON CONFLICT DO NOTHING",
    )
    .bind(session.id)
    .bind(session.student_id)
    .bind(session.course_id)
    .bind(session.started_at)
    .bind(session.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Sets `started_at` only if it is still empty and returns the effective value.
pub(crate) async fn mark_started(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<time::PrimitiveDateTime, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE exam_sessions
         SET started_at = COALESCE(started_at, $1), updated_at = $1
         WHERE id = $2
         RETURNING started_at",
    )
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    mode: CompletionMode,
    score: i32,
    now: time::PrimitiveDateTime,
) -> Result<ExamSession, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "UPDATE exam_sessions
         SET is_completed = TRUE, completed_at = $1, completion_mode = $2,
             score = $3, updated_at = $1
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(mode)
    .bind(score)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_history(
    pool: &PgPool,
    student_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<SessionHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionHistoryRow>(
        "SELECT s.id AS session_id, s.course_id, c.title AS course_title, s.started_at,
                s.is_completed, s.completed_at, s.completion_mode, s.score,
                r.total_marks, r.percentage, s.created_at
         FROM exam_sessions s
         JOIN courses c ON c.id = s.course_id
         LEFT JOIN results r ON r.session_id = s.id
         WHERE s.student_id = $1
         ORDER BY s.created_at DESC, s.id
         OFFSET $2 LIMIT $3",
    )
    .bind(student_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_student(pool: &PgPool, student_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
}
