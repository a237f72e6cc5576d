use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Course, CourseResultRow, CourseWithCount, Question};
use crate::db::types::{CompletionMode, QuestionType};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 5, max = 240, message = "time_limit_minutes must be between 5 and 240"))]
    pub(crate) time_limit_minutes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) time_limit_minutes: i32,
    pub(crate) question_count: i64,
    pub(crate) created_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            teacher_id: course.teacher_id,
            time_limit_minutes: course.time_limit_minutes,
            question_count: 0,
            created_at: format_primitive(course.created_at),
        }
    }

    pub(crate) fn from_listing(course: CourseWithCount) -> Self {
        Self {
            id: course.id,
            title: course.title,
            teacher_id: course.teacher_id,
            time_limit_minutes: course.time_limit_minutes,
            question_count: course.question_count,
            created_at: format_primitive(course.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 1, max = 5000, message = "prompt must be 1-5000 characters"))]
    pub(crate) prompt: String,
    #[serde(default)]
    pub(crate) choices: Vec<String>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: String,
    #[serde(default = "default_marks")]
    #[validate(range(min = 1, max = 1000, message = "marks must be between 1 and 1000"))]
    pub(crate) marks: i32,
}

fn default_marks() -> i32 {
    1
}

/// Author's view of a question, answer key included.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) order_index: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) prompt: String,
    pub(crate) choices: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) marks: i32,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            course_id: question.course_id,
            order_index: question.order_index,
            question_type: question.question_type,
            prompt: question.prompt,
            choices: question.choices.0,
            correct_answer: question.correct_answer,
            marks: question.marks,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResultResponse {
    pub(crate) session_id: String,
    pub(crate) student_id: String,
    pub(crate) student_username: String,
    pub(crate) student_name: String,
    pub(crate) score: i32,
    pub(crate) total_marks: i32,
    pub(crate) percentage: f64,
    pub(crate) completion_mode: Option<CompletionMode>,
    pub(crate) achieved_at: String,
}

impl CourseResultResponse {
    pub(crate) fn from_db(row: CourseResultRow) -> Self {
        Self {
            session_id: row.session_id,
            student_id: row.student_id,
            student_username: row.student_username,
            student_name: row.student_name,
            score: row.score,
            total_marks: row.total_marks,
            percentage: row.percentage,
            completion_mode: row.completion_mode,
            achieved_at: format_primitive(row.achieved_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResultsResponse {
    pub(crate) course: CourseResponse,
    pub(crate) results: Vec<CourseResultResponse>,
}
