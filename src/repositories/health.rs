use sqlx::PgPool;

/// Counts open attempts. Doubles as a readiness check that the exam schema is migrated.
pub(crate) async fn open_session_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exam_sessions WHERE NOT is_completed")
        .fetch_one(pool)
        .await
}
