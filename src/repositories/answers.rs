use uuid::Uuid;

use crate::db::models::{GradedAnswerRow, StudentAnswer};

const COLUMNS: &str =
    "id, session_id, question_id, chosen_answer, is_correct, created_at, updated_at";

/// Inserts or overwrites the answer for one (session, question) pair.
/// Correctness is reset; grading happens when the session completes.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    question_id: &str,
    chosen_answer: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_answers (
            id, session_id, question_id, chosen_answer, is_correct, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,FALSE,$5,$5)
        ON CONFLICT (session_id, question_id) DO UPDATE
        SET chosen_answer = EXCLUDED.chosen_answer,
            is_correct = FALSE,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(session_id)
    .bind(question_id)
    .bind(chosen_answer)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "SELECT {COLUMNS} FROM student_answers WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}

/// Recorded answers joined with their questions, in question order.
pub(crate) async fn list_with_questions(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<GradedAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, GradedAnswerRow>(
        "SELECT a.id AS answer_id, q.id AS question_id, q.order_index, q.question_type,
                q.prompt, q.correct_answer, q.marks, a.chosen_answer, a.is_correct
         FROM student_answers a
         JOIN questions q ON q.id = a.question_id
         WHERE a.session_id = $1
         ORDER BY q.order_index, q.created_at, q.id",
    )
    .bind(session_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn set_is_correct(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
    is_correct: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE student_answers SET is_correct = $1 WHERE id = $2")
        .bind(is_correct)
        .bind(answer_id)
        .execute(executor)
        .await?;
    Ok(())
}
