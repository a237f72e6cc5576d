pub(crate) mod access;
pub(crate) mod approval;
pub(crate) mod authoring;
pub(crate) mod exam_sessions;
pub(crate) mod exam_timing;
pub(crate) mod scoring;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ExamError {
    #[error("course has no questions")]
    NoQuestions,
    #[error("session belongs to another student")]
    NotOwner,
    #[error("session is already completed")]
    AlreadyCompleted,
    #[error("every question needs an answer ({} missing)", .missing.len())]
    IncompleteSubmission { missing: Vec<String> },
    #[error("question {0} does not belong to this course")]
    UnknownQuestion(String),
    #[error("answer for question {question_id} exceeds {limit} characters")]
    AnswerTooLong { question_id: String, limit: usize },
    #[error("time limit has passed, submit the session instead")]
    DeadlinePassed,
    #[error("only students can take exams")]
    NotStudent,
    #[error("only approved teachers can author courses")]
    NotAuthor,
    #[error("not the owner of this course")]
    NotCourseOwner,
    #[error("course not found")]
    CourseNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("session is not completed yet")]
    NotCompleted,
    #[error("an open session for this course already exists")]
    SessionConflict,
    #[error("invalid course: {0}")]
    InvalidCourse(String),
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
    #[error("score total exceeds the supported range")]
    ScoreOverflow,
    #[error("user not found")]
    UserNotFound,
    #[error("only teacher accounts can be approved")]
    NotTeacher,
    #[error("admin access required")]
    NotAdmin,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
