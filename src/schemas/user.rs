use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::User;
use crate::services::access::Principal;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserLogin {
    #[validate(length(min = 1, max = 150, message = "username must be 1-150 characters"))]
    pub(crate) username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) is_student: bool,
    pub(crate) is_teacher: bool,
    pub(crate) is_approved: bool,
    pub(crate) is_admin: bool,
    pub(crate) can_take_exams: bool,
    pub(crate) can_author: bool,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self::from_principal(Principal::from(user))
    }

    pub(crate) fn from_principal(principal: Principal) -> Self {
        Self {
            can_take_exams: principal.can_take_exams(),
            can_author: principal.can_author(),
            id: principal.id,
            username: principal.username,
            full_name: principal.full_name,
            is_student: principal.is_student,
            is_teacher: principal.is_teacher,
            is_approved: principal.is_approved,
            is_admin: principal.is_admin,
        }
    }
}
