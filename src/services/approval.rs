use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::services::access::{self, Principal};
use crate::services::ExamError;

pub(crate) async fn pending_teachers(
    pool: &PgPool,
    admin: &Principal,
) -> Result<Vec<User>, ExamError> {
    access::require_admin(admin)?;
    Ok(repositories::users::list_pending_teachers(pool).await?)
}

/// Grants authoring rights to a teacher account. Approving twice is a no-op.
pub(crate) async fn approve_teacher(
    pool: &PgPool,
    admin: &Principal,
    user_id: &str,
) -> Result<User, ExamError> {
    access::require_admin(admin)?;

    let user =
        repositories::users::find_by_id(pool, user_id).await?.ok_or(ExamError::UserNotFound)?;
    if !user.is_teacher {
        return Err(ExamError::NotTeacher);
    }
    if user.is_approved {
        return Ok(user);
    }

    let approved = repositories::users::approve(pool, &user.id, primitive_now_utc())
        .await?
        .ok_or(ExamError::UserNotFound)?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %approved.id,
        action = "teacher_approve",
        "Admin approved teacher"
    );
    Ok(approved)
}
