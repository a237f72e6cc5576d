use sqlx::PgPool;

use crate::db::models::{Course, CourseWithCount};

pub(crate) const COLUMNS: &str =
    "id, title, teacher_id, time_limit_minutes, created_at, updated_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) teacher_id: Option<&'a str>,
    pub(crate) time_limit_minutes: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (id, title, teacher_id, time_limit_minutes, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.teacher_id)
    .bind(params.time_limit_minutes)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Courses visible to the caller. `teacher_id = None` lists every course.
pub(crate) async fn list_with_counts(
    pool: &PgPool,
    teacher_id: Option<&str>,
) -> Result<Vec<CourseWithCount>, sqlx::Error> {
    sqlx::query_as::<_, CourseWithCount>(
        "SELECT c.id, c.title, c.teacher_id, c.time_limit_minutes, c.created_at,
                COUNT(q.id) AS question_count
         FROM courses c
         LEFT JOIN questions q ON q.course_id = c.id
         WHERE ($1::text IS NULL OR c.teacher_id = $1)
         GROUP BY c.id
         ORDER BY c.created_at DESC, c.id",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}
