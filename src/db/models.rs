use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{CompletionMode, QuestionType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_student: bool,
    pub(crate) is_teacher: bool,
    pub(crate) is_approved: bool,
    pub(crate) is_admin: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) time_limit_minutes: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseWithCount {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) time_limit_minutes: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) question_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: String,
    pub(crate) choices: Json<Vec<String>>,
    pub(crate) correct_answer: String,
    pub(crate) marks: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) started_at: Option<PrimitiveDateTime>,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) completion_mode: Option<CompletionMode>,
    pub(crate) score: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentAnswer {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) chosen_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A recorded answer joined with the question it belongs to.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct GradedAnswerRow {
    pub(crate) answer_id: String,
    pub(crate) question_id: String,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: String,
    pub(crate) correct_answer: String,
    pub(crate) marks: i32,
    pub(crate) chosen_answer: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResult {
    pub(crate) session_id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
    pub(crate) achieved_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseResultRow {
    pub(crate) session_id: String,
    pub(crate) student_id: String,
    pub(crate) student_username: String,
    pub(crate) student_name: String,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
    pub(crate) completion_mode: Option<CompletionMode>,
    pub(crate) achieved_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SessionHistoryRow {
    pub(crate) session_id: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) started_at: Option<PrimitiveDateTime>,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) completion_mode: Option<CompletionMode>,
    pub(crate) score: i32,
    pub(crate) total_marks: Option<i32>,
    pub(crate) percentage: Option<f64>,
    pub(crate) created_at: PrimitiveDateTime,
}
