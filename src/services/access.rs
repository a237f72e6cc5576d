use crate::db::models::{Course, ExamSession, User};
use crate::services::ExamError;

/// The authenticated caller, passed explicitly into every service operation.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) is_student: bool,
    pub(crate) is_teacher: bool,
    pub(crate) is_approved: bool,
    pub(crate) is_admin: bool,
    pub(crate) is_active: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            is_student: user.is_student,
            is_teacher: user.is_teacher,
            is_approved: user.is_approved,
            is_admin: user.is_admin,
            is_active: user.is_active,
        }
    }
}

impl Principal {
    pub(crate) fn can_take_exams(&self) -> bool {
        self.is_active && self.is_student
    }

    /// Teachers need approval before they may create courses and questions.
    pub(crate) fn can_author(&self) -> bool {
        self.is_active && (self.is_admin || (self.is_teacher && self.is_approved))
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.is_active && self.is_admin
    }
}

pub(crate) fn can_manage_course(principal: &Principal, course: &Course) -> bool {
    if principal.is_admin() {
        return true;
    }

    principal.can_author() && course.teacher_id.as_deref() == Some(principal.id.as_str())
}

pub(crate) fn require_course_owner(principal: &Principal, course: &Course) -> Result<(), ExamError> {
    if can_manage_course(principal, course) {
        Ok(())
    } else {
        Err(ExamError::NotCourseOwner)
    }
}

pub(crate) fn require_student(principal: &Principal) -> Result<(), ExamError> {
    if principal.can_take_exams() {
        Ok(())
    } else {
        Err(ExamError::NotStudent)
    }
}

pub(crate) fn require_author(principal: &Principal) -> Result<(), ExamError> {
    if principal.can_author() {
        Ok(())
    } else {
        Err(ExamError::NotAuthor)
    }
}

pub(crate) fn require_admin(principal: &Principal) -> Result<(), ExamError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ExamError::NotAdmin)
    }
}

/// Results are visible to the student who sat the exam and to whoever manages the course.
pub(crate) fn can_view_session(principal: &Principal, session: &ExamSession, course: &Course) -> bool {
    session.student_id == principal.id || can_manage_course(principal, course)
}
